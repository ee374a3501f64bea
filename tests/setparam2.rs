mod common;

use std::error::Error;

use mapedit::commands::{setparam2, Instance};
use mapedit::geometry::{Area, Vec3};
use mapedit::mapblock::Mapblock;
use mapedit::progress::NullProgress;
use mapedit::store::SqliteStore;

const DIR: &str = "test-setparam2";

#[async_std::test]
async fn whole_block_sets_every_param2() -> Result<(), Box<dyn Error>> {
    common::tear_up(DIR).await?;
    let result = whole_block().await;
    common::tear_down(DIR).await?;
    result
}

async fn whole_block() -> Result<(), Box<dyn Error>> {
    let path = format!("{DIR}/map.sqlite");
    let content = [1u16; 4096];
    let blob = common::build_block(&content, &[b"air", b"default:stone"]);
    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let mut inst = Instance::new(db, None, false, NullProgress);
    setparam2::run(&mut inst, 7, Some("default:stone"), None, false).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let arrays = block.deserialize_node_data()?;
    assert!(arrays.param2.iter().all(|&p| p == 7));
    Ok(())
}

#[async_std::test]
async fn partial_area_sets_only_the_overlap() -> Result<(), Box<dyn Error>> {
    let dir = "test-setparam2-partial";
    common::tear_up(dir).await?;
    let result = partial(dir).await;
    common::tear_down(dir).await?;
    result
}

async fn partial(dir: &str) -> Result<(), Box<dyn Error>> {
    let path = format!("{dir}/map.sqlite");
    let content = [1u16; 4096];
    let blob = common::build_block(&content, &[b"air", b"default:stone"]);
    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let area = Area::new(Vec3::new(0, 0, 0), Vec3::new(15, 15, 7));
    let mut inst = Instance::new(db, None, false, NullProgress);
    setparam2::run(&mut inst, 9, None, Some(area), false).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let arrays = block.deserialize_node_data()?;
    for z in 0..16 {
        for y in 0..16 {
            for x in 0..16 {
                let idx = x + 16 * y + 256 * z;
                let expected = if z < 8 { 9 } else { 0 };
                assert_eq!(arrays.param2[idx], expected, "z={z}");
            }
        }
    }
    Ok(())
}
