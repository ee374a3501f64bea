//! `setparam2`: overwrite param2 across an area and/or matching node.

use crate::commands::{lookup_content_id, skip_on_error, Instance};
use crate::error::MapEditError;
use crate::geometry::{get_block_overlap, Area, Vec3, MAPBLOCK_SIZE};
use crate::mapblock::Mapblock;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    paramval: i32,
    search_node: Option<&str>,
    area: Option<Area>,
    invert: bool,
) -> Result<(), MapEditError> {
    if !(0..=255).contains(&paramval) {
        return Err(inst.fatal("param2 value must be between 0 and 255."));
    }
    if search_node.is_none() && area.is_none() {
        return Err(inst.fatal("This command requires area and/or searchnode."));
    }
    let paramval = paramval as u8;

    inst.begin()?;

    let search_node = search_node.map(str::as_bytes);
    let block_keys = get_mapblocks(&inst.db, search_node, area, invert, true).await?;

    let total = block_keys.len();
    for (i, key) in block_keys.into_iter().enumerate() {
        inst.update_progress(i, total);

        let Some(data) = inst.db.get(key).await? else { continue };
        let mut block = skip_on_error!(Mapblock::parse(&data), key);

        let search_id = if let Some(search_node) = search_node {
            let nimap = skip_on_error!(block.deserialize_nimap(), key);
            let Some(id) = lookup_content_id(&nimap, search_node) else { continue };
            Some(id)
        } else {
            None
        };

        let mut arrays = skip_on_error!(block.deserialize_node_data(), key);
        let overlap = area.and_then(|a| get_block_overlap(Vec3::from_block_key(key), a, true));
        let whole_block = area.is_none() || overlap.map_or(true, |o| o.is_full_mapblock());

        if whole_block {
            for (param2, &content) in arrays.param2.iter_mut().zip(arrays.content.iter()) {
                if search_id.map_or(true, |id| content == id) {
                    *param2 = paramval;
                }
            }
        } else {
            let overlap = overlap.expect("checked above");
            let mut mask = [invert; MAPBLOCK_SIZE];
            let (zs, ys, xs) = overlap.to_array_slices();
            for z in zs {
                for y in ys.clone() {
                    for x in xs.clone() {
                        mask[x + 16 * y + 256 * z] = !invert;
                    }
                }
            }

            for ((param2, &selected), &content) in
                arrays.param2.iter_mut().zip(mask.iter()).zip(arrays.content.iter())
            {
                if selected && search_id.map_or(true, |id| content == id) {
                    *param2 = paramval;
                }
            }
        }

        block.serialize_node_data(&arrays);
        inst.db.put(key, block.serialize());
    }

    inst.finish();
    Ok(())
}
