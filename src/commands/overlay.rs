//! `overlay`: copy part or all of a secondary world file into the primary
//! one.

use crate::commands::{round_to_block, skip_on_error, Instance};
use crate::error::MapEditError;
use crate::geometry::{get_block_overlap, get_mapblock_area, Area, Vec3};
use crate::mapblock::Mapblock;
use crate::merge::Merge;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    area: Option<Area>,
    invert: bool,
    requested_offset: Option<Vec3>,
    blockmode: bool,
) -> Result<(), MapEditError> {
    let mut offset = requested_offset.unwrap_or(Vec3::new(0, 0, 0));

    if offset != Vec3::new(0, 0, 0) && invert {
        return Err(inst.fatal("Cannot offset an inverted selection."));
    }

    let block_offset = if blockmode {
        let rounded = offset.map(round_to_block);
        offset = rounded * 16;
        if requested_offset.is_some() {
            inst.info(&format!("blockmode: offset rounded to ({}, {}, {}).", offset.x, offset.y, offset.z));
        }
        Some(rounded)
    } else {
        None
    };

    inst.begin()?;

    let dst_area = area.map(|a| a + offset);
    let block_keys = if blockmode {
        let sdb = inst.sdb.as_ref().expect("overlay requires a secondary store");
        get_mapblocks(sdb, None, area, invert, false).await?
    } else {
        get_mapblocks(&inst.db, None, dst_area, invert, true).await?
    };

    let total = block_keys.len();
    for (i, key) in block_keys.into_iter().enumerate() {
        inst.update_progress(i, total);
        let pos = Vec3::from_block_key(key);

        if let Some(block_offset) = block_offset {
            let dst_pos = pos + block_offset;
            if !dst_pos.is_valid_block_pos() {
                continue;
            }
            let Some(src_data) = inst.sdb.as_ref().unwrap().get(key).await? else { continue };
            if !Mapblock::is_valid_generated(&src_data) {
                continue;
            }
            inst.db.put_force(dst_pos.to_block_key(), src_data);
            continue;
        }

        let Some(dst_data) = inst.db.get(key).await? else { continue };
        if !Mapblock::is_valid_generated(&dst_data) {
            continue;
        }
        let dst_block = skip_on_error!(Mapblock::parse(&dst_data), key);

        if invert {
            // Inverted selections cannot have an offset (checked above):
            // the secondary block at the same key is the new base, with
            // the primary block's overlap with the (uninverted) area
            // layered back on top of it.
            let Some(src_data) = inst.sdb.as_ref().unwrap().get(key).await? else { continue };
            if !Mapblock::is_valid_generated(&src_data) {
                continue;
            }
            let src_block = skip_on_error!(Mapblock::parse(&src_data), key);

            let dst_area = dst_area.expect("invert requires an area");
            if let Some(overlap) = get_block_overlap(pos, dst_area, true) {
                let mut merge = Merge::new(src_block);
                merge.add_layer(dst_block, overlap, overlap);
                let merged = skip_on_error!(merge.merge(), key);
                inst.db.put(key, merged.serialize());
            } else {
                inst.db.put(key, src_data);
            }
            continue;
        }

        let dst_area = dst_area.expect("non-blockmode overlay requires a destination area");
        let mut merge = Merge::new(dst_block);
        let Some(dst_block_overlap) = get_block_overlap(pos, dst_area, false) else { continue };
        let src_overlap_area = dst_block_overlap - offset;
        let src_blocks_included = get_mapblock_area(src_overlap_area, false, true);

        for src_pos in src_blocks_included.iter() {
            if !src_pos.is_valid_block_pos() {
                continue;
            }
            let Some(src_data) = inst.sdb.as_ref().unwrap().get(src_pos.to_block_key()).await? else { continue };
            if !Mapblock::is_valid_generated(&src_data) {
                continue;
            }
            let src_block = skip_on_error!(Mapblock::parse(&src_data), src_pos.to_block_key());

            let Some(src_block_frag) = get_block_overlap(src_pos, src_overlap_area, false) else { continue };
            let Some(src_to_dest_frag) = get_block_overlap(pos, src_block_frag + offset, true) else { continue };

            let src_corner_pos = src_pos * 16;
            merge.add_layer(src_block, src_block_frag - src_corner_pos, src_to_dest_frag);
        }

        let merged = skip_on_error!(merge.merge(), key);
        inst.db.put(key, merged.serialize());
    }

    inst.finish();
    Ok(())
}
