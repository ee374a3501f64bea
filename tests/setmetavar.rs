mod common;

use std::error::Error;

use mapedit::commands::{setmetavar, Instance};
use mapedit::mapblock::Mapblock;
use mapedit::metadata::deserialize_metadata_vars;
use mapedit::progress::NullProgress;
use mapedit::store::SqliteStore;

const DIR: &str = "test-setmetavar";

#[async_std::test]
async fn overwrites_existing_key_leaves_absent_key_untouched() -> Result<(), Box<dyn Error>> {
    common::tear_up(DIR).await?;
    let result = run().await;
    common::tear_down(DIR).await?;
    result
}

async fn run() -> Result<(), Box<dyn Error>> {
    let path = format!("{DIR}/map.sqlite");
    let content = [1u16; 4096];
    let mut blob = common::build_block(&content, &[b"air", b"default:chest"]);

    // pos 0 has "infotext", pos 1 does not.
    common::add_metadata(&mut blob, 0, &[(b"infotext", b"old text")]);
    common::add_metadata(&mut blob, 1, &[(b"owner", b"someone")]);
    common::make_store(&path, &[(0, blob)]).await;

    let db = SqliteStore::open(&path).await?;
    let mut inst = Instance::new(db, None, false, NullProgress);
    setmetavar::run(&mut inst, "infotext", "new text", None, None, false).await?;
    inst.db.commit().await?;

    let db = SqliteStore::open(&path).await?;
    let data = db.get(0).await?.unwrap();
    let block = Mapblock::parse(&data)?;
    let records = block.deserialize_metadata()?;
    let version = block.metadata_version();

    let rec0 = records.iter().find(|r| r.pos == 0).unwrap();
    let vars0 = deserialize_metadata_vars(&rec0.vars, rec0.num_vars, version)?;
    assert_eq!(vars0.value(b"infotext"), Some(&b"new text"[..]));

    let rec1 = records.iter().find(|r| r.pos == 1).unwrap();
    let vars1 = deserialize_metadata_vars(&rec1.vars, rec1.num_vars, version)?;
    assert_eq!(vars1.value(b"owner"), Some(&b"someone"[..]));
    assert_eq!(vars1.value(b"infotext"), None);
    Ok(())
}
