//! `setmetavar`: overwrite the value of an existing node metadata variable.

use crate::commands::{lookup_content_id, pos_selected, Instance};
use crate::error::MapEditError;
use crate::geometry::{Area, Vec3};
use crate::mapblock::Mapblock;
use crate::metadata::{deserialize_metadata_vars, serialize_metadata_vars};
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    meta_key: &str,
    meta_value: &str,
    search_node: Option<&str>,
    area: Option<Area>,
    invert: bool,
) -> Result<(), MapEditError> {
    if search_node.is_none() && area.is_none() {
        return Err(inst.fatal("This command requires area and/or searchnode."));
    }

    let meta_key = meta_key.as_bytes();
    let meta_value = meta_value.as_bytes();

    inst.begin()?;

    let search_node = search_node.map(str::as_bytes);
    let block_keys = get_mapblocks(&inst.db, search_node, area, invert, true).await?;

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

        let search_id = if let Some(search_node) = search_node {
            let nimap = match block.deserialize_nimap() {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("mapblock {key}: {e}");
                    continue;
                }
            };
            let Some(id) = lookup_content_id(&nimap, search_node) else { continue };
            Some(id)
        } else {
            None
        };

        let corner = Vec3::from_block_key(key) * 16;
        let version = block.metadata_version();
        let mut meta_list = match block.deserialize_metadata() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("mapblock {key}: {e}");
                continue;
            }
        };

        let mut modified = false;
        for record in meta_list.iter_mut() {
            if !pos_selected(area, invert, corner, record.pos) {
                continue;
            }
            if let Some(search_id) = search_id {
                match block.content_id_at(record.pos) {
                    Ok(id) if id == search_id => {}
                    Ok(_) => continue,
                    Err(e) => {
                        log::warn!("mapblock {key}: {e}");
                        continue;
                    }
                }
            }

            let mut vars = match deserialize_metadata_vars(&record.vars, record.num_vars, version) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("mapblock {key}: {e}");
                    continue;
                }
            };
            if vars.contains_key(meta_key) {
                vars.set_value(meta_key, meta_value.to_vec());
                record.vars = serialize_metadata_vars(&vars, version);
                modified = true;
            }
        }

        if modified {
            block.serialize_metadata(&meta_list, version);
            inst.db.put(key, block.serialize());
        }
    }

    inst.finish();
    Ok(())
}
