mod common;

use std::error::Error;

use mapedit::commands::{clone, Instance};
use mapedit::geometry::{Area, Vec3};
use mapedit::mapblock::Mapblock;
use mapedit::progress::NullProgress;
use mapedit::store::SqliteStore;

const DIR: &str = "test-clone";

#[async_std::test]
async fn blockmode_offset_copies_whole_block() -> Result<(), Box<dyn Error>> {
    common::tear_up(DIR).await?;
    let result = run().await;
    common::tear_down(DIR).await?;
    result
}

async fn run() -> Result<(), Box<dyn Error>> {
    let path = format!("{DIR}/map.sqlite");
    let content = [1u16; 4096];
    let blob = common::build_block(&content, &[b"air", b"default:cobble"]);
    let src_key = Vec3::new(0, 0, 0).to_block_key();
    common::make_store(&path, &[(src_key, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let area = Area::new(Vec3::new(0, 0, 0), Vec3::new(15, 15, 15));
    let offset = Vec3::new(16, 0, 0);
    let mut inst = Instance::new(db, None, false, NullProgress);
    clone::run(&mut inst, area, offset, true).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let dst_key = Vec3::new(1, 0, 0).to_block_key();
    let data = db.get(dst_key).await?.expect("destination block written");
    let block = Mapblock::parse(&data)?;
    let nimap = block.deserialize_nimap()?;
    assert_eq!(nimap, vec![b"air".to_vec(), b"default:cobble".to_vec()]);
    let arrays = block.deserialize_node_data()?;
    assert!(arrays.content.iter().all(|&c| c == 1));

    // Source block untouched.
    let src_data = db.get(src_key).await?.expect("source block still present");
    let src_block = Mapblock::parse(&src_data)?;
    let src_arrays = src_block.deserialize_node_data()?;
    assert!(src_arrays.content.iter().all(|&c| c == 1));
    Ok(())
}
