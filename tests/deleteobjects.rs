mod common;

use std::error::Error;

use mapedit::commands::{deleteobjects, Instance};
use mapedit::mapblock::Mapblock;
use mapedit::progress::NullProgress;
use mapedit::store::SqliteStore;

const DIR: &str = "test-deleteobjects";

fn pos_bytes(x: i32, y: i32, z: i32) -> [u8; 12] {
    let mut out = [0u8; 12];
    out[0..4].copy_from_slice(&(x * 10_000).to_be_bytes());
    out[4..8].copy_from_slice(&(y * 10_000).to_be_bytes());
    out[8..12].copy_from_slice(&(z * 10_000).to_be_bytes());
    out
}

fn item_entity_data(itemstring: &str) -> Vec<u8> {
    let inner = format!(r#"return {{["itemstring"] = "{itemstring}"}}"#);
    let mut blob = Vec::new();
    blob.push(1u8);
    let name = b"__builtin:item";
    blob.extend_from_slice(&(name.len() as u16).to_be_bytes());
    blob.extend_from_slice(name);
    blob.extend_from_slice(&(inner.len() as u32).to_be_bytes());
    blob.extend_from_slice(inner.as_bytes());
    blob
}

#[async_std::test]
async fn deletes_only_matching_dropped_item() -> Result<(), Box<dyn Error>> {
    common::tear_up(DIR).await?;
    let result = run().await;
    common::tear_down(DIR).await?;
    result
}

async fn run() -> Result<(), Box<dyn Error>> {
    let path = format!("{DIR}/map.sqlite");
    let content = [0u16; 4096];
    let mut blob = common::build_block(&content, &[b"air"]);

    common::add_static_object(&mut blob, 1, pos_bytes(5, 5, 5), &item_entity_data("default:cobble"));
    common::add_static_object(&mut blob, 1, pos_bytes(6, 6, 6), &item_entity_data("default:stone"));

    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let mut inst = Instance::new(db, None, false, NullProgress);
    deleteobjects::run(&mut inst, Some("default:cobble"), true, None, false).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let objects = block.deserialize_static_objects()?;
    assert_eq!(objects.len(), 1);
    let remaining = mapedit::metadata::deserialize_object_data(&objects[0].data)?;
    assert!(String::from_utf8_lossy(&remaining.data).contains("default:stone"));
    Ok(())
}
