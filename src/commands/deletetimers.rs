//! `deletetimers`: drop node timers matching an area and/or node.

use crate::commands::{lookup_content_id, pos_selected, Instance};
use crate::error::MapEditError;
use crate::geometry::{Area, Vec3};
use crate::mapblock::Mapblock;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    search_node: Option<&str>,
    area: Option<Area>,
    invert: bool,
) -> Result<(), MapEditError> {
    if search_node.is_none() && area.is_none() {
        return Err(inst.fatal("This command requires area and/or searchnode."));
    }

    inst.begin()?;

    let search_node = search_node.map(str::as_bytes);
    let block_keys = get_mapblocks(&inst.db, search_node, area, invert, true).await?;

    let total = block_keys.len();
    'blocks: for (i, key) in block_keys.into_iter().enumerate() {
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
        let mut timer_list = match block.deserialize_node_timers() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("mapblock {key}: {e}");
                continue;
            }
        };

        let mut to_delete = Vec::new();
        for (j, timer) in timer_list.iter().enumerate() {
            if !pos_selected(area, invert, corner, timer.pos) {
                continue;
            }
            if let Some(search_id) = search_id {
                match block.content_id_at(timer.pos) {
                    Ok(id) if id == search_id => {}
                    Ok(_) => continue,
                    Err(e) => {
                        log::warn!("mapblock {key}: {e}");
                        continue 'blocks;
                    }
                }
            }
            to_delete.push(j);
        }

        if to_delete.is_empty() {
            continue;
        }
        for &j in to_delete.iter().rev() {
            timer_list.remove(j);
        }

        block.serialize_node_timers(&timer_list);
        inst.db.put(key, block.serialize());
    }

    inst.finish();
    Ok(())
}
