//! `replaceininv`: rewrite `Item <name> ...` lines inside node inventories.

use crate::commands::{lookup_content_id, pos_selected, Instance};
use crate::error::MapEditError;
use crate::geometry::{Area, Vec3};
use crate::mapblock::Mapblock;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    search_node: Option<&str>,
    search_item: &str,
    replace_item: &str,
    delete_item_meta: bool,
    area: Option<Area>,
    invert: bool,
) -> Result<(), MapEditError> {
    inst.begin()?;

    let search_node = search_node.map(str::as_bytes);
    let search_item = search_item.as_bytes();
    let replace_item = replace_item.as_bytes();
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

            let mut new_lines: Vec<Vec<u8>> = Vec::new();
            for line in record.inv.split(|&b| b == b'\n') {
                let parts: Vec<&[u8]> = line.splitn(5, |&b| b == b' ').collect();
                if parts.len() >= 2 && parts[0] == &b"Item"[..] && parts[1] == search_item {
                    let new_parts: Vec<Vec<u8>> = if replace_item == b"Empty" {
                        vec![b"Empty".to_vec()]
                    } else {
                        let mut owned: Vec<Vec<u8>> = parts.iter().map(|p| p.to_vec()).collect();
                        owned[1] = replace_item.to_vec();
                        if owned.len() == 5 && delete_item_meta {
                            owned.truncate(4);
                        }
                        owned
                    };
                    new_lines.push(join_with(&new_parts, b' '));
                    modified = true;
                } else {
                    new_lines.push(line.to_vec());
                }
            }
            record.inv = join_with(&new_lines, b'\n');
        }

        if modified {
            block.serialize_metadata(&meta_list, version);
            inst.db.put(key, block.serialize());
        }
    }

    inst.finish();
    Ok(())
}

fn join_with(parts: &[Vec<u8>], sep: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.extend_from_slice(part);
    }
    out
}
