mod common;

use std::error::Error;

use mapedit::commands::{replacenodes, Instance};
use mapedit::geometry::{Area, Vec3};
use mapedit::mapblock::Mapblock;
use mapedit::progress::NullProgress;
use mapedit::store::SqliteStore;

const DIR: &str = "test-replacenodes";

#[async_std::test]
async fn whole_block_rename_collapses_nimap() -> Result<(), Box<dyn Error>> {
    common::tear_up(DIR).await?;
    let result = whole_block().await;
    common::tear_down(DIR).await?;
    result
}

async fn whole_block() -> Result<(), Box<dyn Error>> {
    let path = format!("{DIR}/map.sqlite");
    let content = [1u16; 4096];
    let blob = common::build_block(&content, &[b"air", b"default:stone", b"default:dirt"]);
    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let mut inst = Instance::new(db, None, false, NullProgress);
    replacenodes::run(&mut inst, "default:stone", "default:dirt", None, false).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let nimap = block.deserialize_nimap()?;
    assert_eq!(nimap, vec![b"air".to_vec(), b"default:dirt".to_vec()]);
    let arrays = block.deserialize_node_data()?;
    assert!(arrays.content.iter().all(|&c| c == 1));
    Ok(())
}

#[async_std::test]
async fn partial_rename_keeps_both_entries() -> Result<(), Box<dyn Error>> {
    let dir = "test-replacenodes-partial";
    common::tear_up(dir).await?;
    let result = partial(dir).await;
    common::tear_down(dir).await?;
    result
}

async fn partial(dir: &str) -> Result<(), Box<dyn Error>> {
    let path = format!("{dir}/map.sqlite");
    // Stone everywhere, except one node in the untouched half (z=15) left
    // as air, so "air" stays referenced outside the replaced region and
    // clean_nimap has nothing to collapse.
    let mut content = [1u16; 4096];
    let air_idx = 0 + 16 * 0 + 256 * 15;
    content[air_idx] = 0;
    let blob = common::build_block(&content, &[b"air", b"default:stone", b"default:dirt"]);
    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let area = Area::new(Vec3::new(0, 0, 0), Vec3::new(15, 15, 7));
    let mut inst = Instance::new(db, None, false, NullProgress);
    replacenodes::run(&mut inst, "default:stone", "default:dirt", Some(area), false).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let nimap = block.deserialize_nimap()?;
    assert_eq!(nimap, vec![b"air".to_vec(), b"default:stone".to_vec(), b"default:dirt".to_vec()]);

    let arrays = block.deserialize_node_data()?;
    for z in 0..16 {
        for y in 0..16 {
            for x in 0..16 {
                let idx = x + 16 * y + 256 * z;
                if idx == air_idx {
                    assert_eq!(arrays.content[idx], 0, "z={z}");
                    continue;
                }
                let expected = if z < 8 { 2 } else { 1 };
                assert_eq!(arrays.content[idx], expected, "z={z}");
            }
        }
    }
    Ok(())
}
