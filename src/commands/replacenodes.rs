//! `replacenodes`: rename a node, across a whole store or within an area.

use crate::commands::{lookup_content_id, skip_on_error, Instance};
use crate::error::MapEditError;
use crate::geometry::{get_block_overlap, Area, Vec3, MAPBLOCK_SIZE};
use crate::mapblock::Mapblock;
use crate::merge::clean_nimap;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    search_node: &str,
    replace_node: &str,
    area: Option<Area>,
    invert: bool,
) -> Result<(), MapEditError> {
    if search_node == replace_node {
        return Err(inst.fatal("Search node and replace node are the same."));
    }

    inst.warn(
        "replacenodes will NOT affect param1, param2,\n\
         node metadata, or node timers. Improper usage\n\
         could result in unneeded map clutter.",
    );

    inst.begin()?;

    let search_node = search_node.as_bytes();
    let replace_node = replace_node.as_bytes();
    let block_keys = get_mapblocks(&inst.db, Some(search_node), area, invert, true).await?;

    let total = block_keys.len();
    for (i, key) in block_keys.into_iter().enumerate() {
        inst.update_progress(i, total);

        let Some(data) = inst.db.get(key).await? else { continue };
        let mut block = skip_on_error!(Mapblock::parse(&data), key);
        let mut nimap = skip_on_error!(block.deserialize_nimap(), key);

        let Some(search_id) = lookup_content_id(&nimap, search_node) else { continue };
        let mut arrays = skip_on_error!(block.deserialize_node_data(), key);

        let overlap = area.and_then(|a| get_block_overlap(Vec3::from_block_key(key), a, true));
        let whole_block = area.is_none() || overlap.map_or(true, |o| o.is_full_mapblock());

        if whole_block {
            if let Some(replace_id) = lookup_content_id(&nimap, replace_node) {
                nimap.remove(search_id as usize);
                for c in arrays.content.iter_mut() {
                    if *c == search_id {
                        *c = replace_id;
                    }
                }
                for c in arrays.content.iter_mut() {
                    if *c > search_id {
                        *c -= 1;
                    }
                }
            } else {
                nimap[search_id as usize] = replace_node.to_vec();
            }
        } else {
            let overlap = overlap.expect("checked above");
            if lookup_content_id(&nimap, replace_node).is_none() {
                nimap.push(replace_node.to_vec());
            }
            let replace_id = lookup_content_id(&nimap, replace_node).expect("just inserted");

            let mut mask = [invert; MAPBLOCK_SIZE];
            let (zs, ys, xs) = overlap.to_array_slices();
            for z in zs {
                for y in ys.clone() {
                    for x in xs.clone() {
                        mask[x + 16 * y + 256 * z] = !invert;
                    }
                }
            }

            for (content, &selected) in arrays.content.iter_mut().zip(mask.iter()) {
                if selected && *content == search_id {
                    *content = replace_id;
                }
            }
            clean_nimap(&mut nimap, &mut arrays.content);
        }

        block.serialize_nimap(&nimap);
        block.serialize_node_data(&arrays);
        inst.db.put(key, block.serialize());
    }

    inst.finish();
    Ok(())
}
