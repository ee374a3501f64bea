mod common;

use std::error::Error;

use mapedit::commands::{fill, Instance};
use mapedit::geometry::{Area, Vec3};
use mapedit::mapblock::Mapblock;
use mapedit::progress::NullProgress;
use mapedit::store::SqliteStore;

const DIR: &str = "test-fill";

#[async_std::test]
async fn blockmode_fills_whole_block_regardless_of_area() -> Result<(), Box<dyn Error>> {
    common::tear_up(DIR).await?;
    let result = blockmode().await;
    common::tear_down(DIR).await?;
    result
}

async fn blockmode() -> Result<(), Box<dyn Error>> {
    let path = format!("{DIR}/map.sqlite");
    let content = [0u16; 4096];
    let blob = common::build_block(&content, &[b"air"]);
    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    // A sliver area, but blockmode should still overwrite the whole block.
    let area = Area::new(Vec3::new(0, 0, 0), Vec3::new(1, 1, 1));
    let mut inst = Instance::new(db, None, false, NullProgress);
    fill::run(&mut inst, "default:stone", Some(area), false, true).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let nimap = block.deserialize_nimap()?;
    assert_eq!(nimap, vec![b"default:stone".to_vec()]);
    let arrays = block.deserialize_node_data()?;
    assert!(arrays.content.iter().all(|&c| c == 0));
    Ok(())
}

#[async_std::test]
async fn partial_area_fills_only_the_overlap() -> Result<(), Box<dyn Error>> {
    let dir = "test-fill-partial";
    common::tear_up(dir).await?;
    let result = partial(dir).await;
    common::tear_down(dir).await?;
    result
}

async fn partial(dir: &str) -> Result<(), Box<dyn Error>> {
    let path = format!("{dir}/map.sqlite");
    let content = [0u16; 4096];
    let blob = common::build_block(&content, &[b"air"]);
    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let area = Area::new(Vec3::new(0, 0, 0), Vec3::new(15, 15, 7));
    let mut inst = Instance::new(db, None, false, NullProgress);
    fill::run(&mut inst, "default:stone", Some(area), false, false).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let nimap = block.deserialize_nimap()?;
    assert_eq!(nimap, vec![b"air".to_vec(), b"default:stone".to_vec()]);

    let arrays = block.deserialize_node_data()?;
    for z in 0..16 {
        for y in 0..16 {
            for x in 0..16 {
                let idx = x + 16 * y + 256 * z;
                let expected = if z < 8 { 1 } else { 0 };
                assert_eq!(arrays.content[idx], expected, "z={z}");
            }
        }
    }
    Ok(())
}
