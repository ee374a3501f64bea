//! Block selection planning: enumerating candidate mapblock keys from the
//! store by coordinate area and/or a raw byte-substring prefilter.

use crate::error::StoreError;
use crate::geometry::{get_mapblock_area, Area, Vec3};
use crate::store::SqliteStore;

const BATCH_SIZE: i64 = 1000;

/// Scans `store` in batches, returning every key whose block:
///
/// - lies inside `area` (or outside, when `invert` is set), if `area` is
///   given; and
/// - has raw data containing `search_data` as a substring, if given.
///
/// `search_data` is a coarse prefilter only (names also appear outside the
/// name-id map, e.g. in entity blobs) — callers that need exact semantics
/// must re-check the decoded block themselves.
pub async fn get_mapblocks(
    store: &SqliteStore,
    search_data: Option<&[u8]>,
    area: Option<Area>,
    invert: bool,
    include_partial: bool,
) -> Result<Vec<i64>, StoreError> {
    let block_area = area.map(|a| get_mapblock_area(a, invert, include_partial));

    let mut keys = Vec::new();
    let mut offset = 0i64;
    loop {
        let batch = store.scan_batch(offset, BATCH_SIZE).await?;
        if batch.is_empty() {
            break;
        }
        offset += batch.len() as i64;

        for (key, data) in batch {
            if let Some(block_area) = block_area {
                let pos = Vec3::from_block_key(key);
                if block_area.contains(pos) == invert {
                    continue;
                }
            }
            if let Some(needle) = search_data {
                if !contains_subslice(&data, needle) {
                    continue;
                }
            }
            keys.push(key);
        }
        log::debug!("building index... {} mapblocks found so far", keys.len());
    }

    log::info!("found {} candidate mapblocks", keys.len());
    Ok(keys)
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    crate::byteio::find_subslice(haystack, needle).is_some()
}
