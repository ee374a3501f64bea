//! `clone`: copy an area to a new location, offset within the same store.

use crate::commands::{round_to_block, skip_on_error, Instance};
use crate::error::MapEditError;
use crate::geometry::{get_block_overlap, get_mapblock_area, Area, Vec3};
use crate::mapblock::Mapblock;
use crate::merge::Merge;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    area: Area,
    requested_offset: Vec3,
    blockmode: bool,
) -> Result<(), MapEditError> {
    let mut offset = requested_offset;
    let block_offset = if blockmode {
        let rounded = offset.map(round_to_block);
        offset = rounded * 16;
        Some(rounded)
    } else {
        None
    };

    if offset == Vec3::new(0, 0, 0) {
        return Err(inst.fatal("Offset cannot be zero."));
    }
    if blockmode {
        inst.info(&format!("blockmode: offset rounded to ({}, {}, {}).", offset.x, offset.y, offset.z));
    }

    inst.begin()?;

    let dst_area = area + offset;
    let mut block_keys = if blockmode {
        get_mapblocks(&inst.db, None, Some(area), false, false).await?
    } else {
        get_mapblocks(&inst.db, None, Some(dst_area), false, true).await?
    };

    // Sort so that, on every axis the offset moves along, destinations are
    // visited in the direction opposite the offset: this guarantees a
    // source block is read before any destination depending on it has been
    // overwritten.
    let sort_dir = offset.map(|n| if n > 0 { -1 } else { 1 });
    let sort_bias = sort_dir.map(|n| if n == -1 { -1 } else { 0 });
    block_keys.sort_by_key(|&key| {
        let pos = Vec3::from_block_key(key);
        Vec3::new(
            pos.x * sort_dir.x + sort_bias.x,
            pos.y * sort_dir.y + sort_bias.y,
            pos.z * sort_dir.z + sort_bias.z,
        )
        .to_block_key()
    });

    let total = block_keys.len();
    for (i, key) in block_keys.into_iter().enumerate() {
        inst.update_progress(i, total);
        let pos = Vec3::from_block_key(key);

        if let Some(block_offset) = block_offset {
            let dst_pos = pos + block_offset;
            if !dst_pos.is_valid_block_pos() {
                continue;
            }
            let Some(src_data) = inst.db.get(key).await? else { continue };
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
        let mut merge = Merge::new(dst_block);

        let Some(dst_block_overlap) = get_block_overlap(pos, dst_area, false) else { continue };
        let src_overlap_area = dst_block_overlap - offset;
        let src_blocks_included = get_mapblock_area(src_overlap_area, false, true);

        for src_pos in src_blocks_included.iter() {
            if !src_pos.is_valid_block_pos() {
                continue;
            }
            let Some(src_data) = inst.db.get(src_pos.to_block_key()).await? else { continue };
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

