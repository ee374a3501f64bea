//! `deleteblocks`: remove every mapblock in (or outside) an area.

use crate::commands::Instance;
use crate::error::MapEditError;
use crate::geometry::Area;
use crate::planner::get_mapblocks;
use crate::progress::ProgressObserver;

pub async fn run<P: ProgressObserver>(
    inst: &mut Instance<P>,
    area: Area,
    invert: bool,
) -> Result<(), MapEditError> {
    inst.begin()?;

    let block_keys = get_mapblocks(&inst.db, None, Some(area), invert, false).await?;
    let total = block_keys.len();
    for (i, key) in block_keys.into_iter().enumerate() {
        inst.update_progress(i, total);
        inst.db.delete(key);
    }

    inst.finish();
    Ok(())
}
