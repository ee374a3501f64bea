use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tokio::fs;

use mapedit::zlib_section;

pub async fn tear_up(dir: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir).await
}

pub async fn tear_down(dir: &str) -> std::io::Result<()> {
    fs::remove_dir_all(dir).await
}

/// Builds a minimal, valid version-28 mapblock blob with the given uniform
/// content array and name-id map; no metadata, objects or timers.
pub fn build_block(content: &[u16; 4096], nimap: &[&[u8]]) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.push(28u8);
    blob.push(0u8);
    blob.extend_from_slice(&0xFFFFu16.to_be_bytes());

    blob.push(2u8);
    blob.push(2u8);

    let mut node_data = Vec::with_capacity(4096 * 4);
    for &c in content {
        node_data.extend_from_slice(&c.to_be_bytes());
    }
    node_data.extend(std::iter::repeat(0u8).take(4096));
    node_data.extend(std::iter::repeat(0u8).take(4096));
    blob.extend_from_slice(&zlib_section::compress(&node_data));
    blob.extend_from_slice(&zlib_section::compress(&[0u8]));

    blob.push(0u8);
    blob.extend_from_slice(&0u16.to_be_bytes());

    blob.extend_from_slice(&0u32.to_be_bytes());

    blob.push(0u8);
    blob.extend_from_slice(&(nimap.len() as u16).to_be_bytes());
    for (id, name) in nimap.iter().enumerate() {
        blob.extend_from_slice(&(id as u16).to_be_bytes());
        blob.extend_from_slice(&(name.len() as u16).to_be_bytes());
        blob.extend_from_slice(name);
    }

    blob.push(10u8);
    blob.extend_from_slice(&0u16.to_be_bytes());

    blob
}

/// Appends a static object (entity or dropped item) to an already-built
/// block. Re-decodes and re-serializes since that's simpler in a test than
/// patching the count field by hand.
pub fn add_static_object(blob: &mut Vec<u8>, type_id: u8, pos: [u8; 12], data: &[u8]) {
    use mapedit::mapblock::{Mapblock, StaticObjectRecord};

    let mut block = Mapblock::parse(blob).expect("test fixture parses");
    let mut objects = block.deserialize_static_objects().expect("test fixture decodes");
    objects.push(StaticObjectRecord { type_id, pos, data: data.to_vec() });
    block.serialize_static_objects(&objects);
    *blob = block.serialize();
}

/// Appends a node metadata record (intra-block `pos`, plus key/value vars)
/// to an already-built block. Re-decodes and re-serializes, as
/// `add_static_object` does.
pub fn add_metadata(blob: &mut Vec<u8>, pos: u16, vars: &[(&[u8], &[u8])]) {
    use mapedit::mapblock::{Mapblock, NodeMetadataRecord};
    use mapedit::metadata::{serialize_metadata_vars, MetaVars};

    let mut block = Mapblock::parse(blob).expect("test fixture parses");
    let mut meta_list = block.deserialize_metadata().expect("test fixture decodes");

    let mut meta_vars = MetaVars::new();
    for (k, v) in vars {
        meta_vars.insert(k.to_vec(), v.to_vec(), 0);
    }
    let version = 2;
    let vars_blob = serialize_metadata_vars(&meta_vars, version);
    meta_list.push(NodeMetadataRecord {
        pos,
        num_vars: vars.len() as u32,
        vars: vars_blob,
        inv: b"EndInventory\n".to_vec(),
    });

    block.serialize_metadata(&meta_list, version);
    *blob = block.serialize();
}

/// Creates a fresh SQLite file at `path` with the `blocks` schema and the
/// given `(pos, data)` rows.
pub async fn make_store(path: &str, blocks: &[(i64, Vec<u8>)]) {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    sqlx::query("CREATE TABLE blocks (pos INTEGER PRIMARY KEY, data BLOB)")
        .execute(&pool)
        .await
        .unwrap();

    for (pos, data) in blocks {
        sqlx::query("INSERT INTO blocks (pos, data) VALUES (?, ?)")
            .bind(pos)
            .bind(data)
            .execute(&pool)
            .await
            .unwrap();
    }

    pool.close().await;
}
