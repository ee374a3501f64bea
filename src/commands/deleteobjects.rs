//! `deleteobjects`: remove entities (or dropped items) matching an area
//! and/or name.

use regex::bytes::Regex;

use crate::commands::Instance;
use crate::error::MapEditError;
use crate::geometry::{Area, Vec3};
use crate::mapblock::Mapblock;
use crate::metadata::deserialize_object_data;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

const ITEM_ENTITY_NAME: &[u8] = b"__builtin:item";

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    search_obj: Option<&str>,
    items: bool,
    area: Option<Area>,
    invert: bool,
) -> Result<(), MapEditError> {
    inst.begin()?;

    let search_obj = search_obj.map(str::as_bytes);
    let search_data = if items { Some(ITEM_ENTITY_NAME) } else { search_obj };
    let block_keys = get_mapblocks(&inst.db, search_data, area, invert, true).await?;

    let itemstring_pattern =
        Regex::new(r#"\["itemstring"\] = "([a-zA-Z0-9_:]+)"#).expect("static pattern is valid");

    let total = block_keys.len();
    for (i, key) in block_keys.into_iter().enumerate() {
        inst.update_progress(i, total);

        let Some(data) = inst.db.get(key).await? else { continue };
        let mut block = match Mapblock::parse(&data) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("mapblock {key}: {e}");
                continue;
            }
        };

        let mut obj_list = match block.deserialize_static_objects() {
            Ok(o) => o,
            Err(e) => {
                log::warn!("mapblock {key}: {e}");
                continue;
            }
        };

        let mut to_delete = Vec::new();
        'objects: for (j, obj) in obj_list.iter().enumerate() {
            if let Some(area) = area {
                let (x, y, z) = Vec3::from_v3f1000(obj.pos);
                if area.contains_point(x, y, z) == invert {
                    continue;
                }
            }

            let object_data = match deserialize_object_data(&obj.data) {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("mapblock {key}: {e}");
                    continue 'objects;
                }
            };

            if items {
                if object_data.name != ITEM_ENTITY_NAME {
                    continue;
                }
                if let Some(search_obj) = search_obj {
                    let matched = itemstring_pattern
                        .captures(&object_data.data)
                        .map(|c| &c[1] == search_obj)
                        .unwrap_or(false);
                    if !matched {
                        continue;
                    }
                }
            } else if let Some(search_obj) = search_obj {
                if object_data.name != search_obj {
                    continue;
                }
            }

            to_delete.push(j);
        }

        if to_delete.is_empty() {
            continue;
        }
        for &j in to_delete.iter().rev() {
            obj_list.remove(j);
        }

        block.serialize_static_objects(&obj_list);
        inst.db.put(key, block.serialize());
    }

    inst.finish();
    Ok(())
}
