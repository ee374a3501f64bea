//! Parsing and serialization of the versioned (25-28) mapblock binary
//! format: the per-block container for node content, lighting, metadata,
//! static objects and node timers.
//!
//! Refer to <https://github.com/minetest/minetest/blob/master/doc/world_format.txt>

use crate::byteio::{read_bytes, read_u16_be, read_u32_be, read_u8};
use crate::error::MapblockError;
use crate::geometry::MAPBLOCK_SIZE;
use crate::zlib_section;

/// The content-id -> name mapping for one mapblock, indexed by content id.
/// Ids must cover a contiguous `0..len()` prefix.
pub type NameIdMap = Vec<Vec<u8>>;

/// The decoded node arrays of a mapblock, one entry per node, indexed
/// `x + 16*y + 256*z`.
#[derive(Debug, Clone)]
pub struct NodeArrays {
    pub content: Box<[u16; MAPBLOCK_SIZE]>,
    pub param1: Box<[u8; MAPBLOCK_SIZE]>,
    pub param2: Box<[u8; MAPBLOCK_SIZE]>,
}

/// Per-position metadata record (a chest's inventory, a sign's text, ...).
#[derive(Debug, Clone)]
pub struct NodeMetadataRecord {
    pub pos: u16,
    pub num_vars: u32,
    /// Raw `key/value/is_private` tuples, undecoded.
    pub vars: Vec<u8>,
    /// Raw inventory blob, including the trailing `"EndInventory\n"`.
    pub inv: Vec<u8>,
}

/// A running node timer.
#[derive(Debug, Clone, Copy)]
pub struct NodeTimerRecord {
    pub pos: u16,
    pub timeout: u32,
    pub elapsed: u32,
}

/// A static object (entity, dropped item, ...).
#[derive(Debug, Clone)]
pub struct StaticObjectRecord {
    pub type_id: u8,
    /// Raw fixed-point `v3f1000` position; decode with [`crate::geometry::Vec3::from_v3f1000`].
    pub pos: [u8; 12],
    pub data: Vec<u8>,
}

/// A parsed mapblock.
///
/// Node arrays and node metadata are decompressed eagerly, since nearly
/// every command touches them. The remaining variable-length sections
/// (name-id map, static objects, node timers) are kept as raw bytes and
/// only structurally decoded on demand via the `deserialize_*` methods, so
/// a command that doesn't touch e.g. static objects never pays to parse
/// them.
#[derive(Debug, Clone)]
pub struct Mapblock {
    pub version: u8,
    pub flags: u8,
    pub lighting_complete: u16,
    pub content_width: u8,
    pub params_width: u8,
    node_data: Vec<u8>,
    node_metadata: Vec<u8>,
    pub static_object_version: u8,
    static_object_count: u16,
    static_objects_raw: Vec<u8>,
    pub timestamp: u32,
    nimap_count: u16,
    nimap_raw: Vec<u8>,
    node_timers_count: u16,
    node_timers_raw: Vec<u8>,
}

impl Mapblock {
    /// Parses a raw, already-zlib-stripped-at-the-file-level mapblock blob
    /// (the `data` column of a `blocks` row).
    pub fn parse(blob: &[u8]) -> Result<Self, MapblockError> {
        let mut data = blob;

        let version = read_u8(&mut data)?;
        if !(25..=28).contains(&version) {
            return Err(MapblockError::UnsupportedVersion(version));
        }

        let flags = read_u8(&mut data)?;
        let lighting_complete = if version >= 27 {
            read_u16_be(&mut data)?
        } else {
            0xFFFF
        };

        let content_width = read_u8(&mut data)?;
        let params_width = read_u8(&mut data)?;
        if content_width != 2 {
            return Err(MapblockError::Malformed(format!(
                "unsupported content_width {content_width}"
            )));
        }
        if params_width != 2 {
            return Err(MapblockError::Malformed(format!(
                "unsupported params_width {params_width}"
            )));
        }

        let (node_data, consumed) = zlib_section::decompress_prefix(data)?;
        data = &data[consumed..];

        let (node_metadata, consumed) = zlib_section::decompress_prefix(data)?;
        data = &data[consumed..];
        if node_metadata.is_empty() {
            return Err(MapblockError::Malformed(
                "empty node metadata section".into(),
            ));
        }

        let static_object_version = read_u8(&mut data)?;
        let static_object_count = read_u16_be(&mut data)?;
        let static_objects_raw = read_length_walked(&mut data, static_object_count as usize, |r| {
            read_u8(r)?;
            read_bytes(r, 12)?;
            let data_len = read_u16_be(r)? as usize;
            read_bytes(r, data_len)?;
            Ok(())
        })?;

        let timestamp = read_u32_be(&mut data)?;

        let nimap_version = read_u8(&mut data)?;
        if nimap_version != 0 {
            return Err(MapblockError::Malformed(format!(
                "unsupported name-id map version {nimap_version}"
            )));
        }
        let nimap_count = read_u16_be(&mut data)?;
        let nimap_raw = read_length_walked(&mut data, nimap_count as usize, |r| {
            read_u16_be(r)?;
            let name_len = read_u16_be(r)? as usize;
            read_bytes(r, name_len)?;
            Ok(())
        })?;

        let timer_record_len = read_u8(&mut data)?;
        if timer_record_len != 10 {
            return Err(MapblockError::Malformed(format!(
                "unsupported node timer record length {timer_record_len}"
            )));
        }
        let node_timers_count = read_u16_be(&mut data)?;
        let node_timers_raw = data.to_vec();

        Ok(Mapblock {
            version,
            flags,
            lighting_complete,
            content_width,
            params_width,
            node_data,
            node_metadata,
            static_object_version,
            static_object_count,
            static_objects_raw,
            timestamp,
            nimap_count,
            nimap_raw,
            node_timers_count,
            node_timers_raw,
        })
    }

    /// Re-serializes this mapblock into its on-disk byte layout, recompressing
    /// the node-data and node-metadata sections.
    pub fn serialize(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.push(self.version);
        blob.push(self.flags);
        if self.version >= 27 {
            blob.extend_from_slice(&self.lighting_complete.to_be_bytes());
        }
        blob.push(self.content_width);
        blob.push(self.params_width);

        blob.extend_from_slice(&zlib_section::compress(&self.node_data));
        blob.extend_from_slice(&zlib_section::compress(&self.node_metadata));

        blob.push(self.static_object_version);
        blob.extend_from_slice(&self.static_object_count.to_be_bytes());
        blob.extend_from_slice(&self.static_objects_raw);

        blob.extend_from_slice(&self.timestamp.to_be_bytes());

        blob.push(0);
        blob.extend_from_slice(&self.nimap_count.to_be_bytes());
        blob.extend_from_slice(&self.nimap_raw);

        blob.push(10);
        blob.extend_from_slice(&self.node_timers_count.to_be_bytes());
        blob.extend_from_slice(&self.node_timers_raw);

        blob
    }

    /// Cheap sanity check for a blob that is supposed to already be a
    /// generated (not "dummy"/air-filled) mapblock: non-trivial length, a
    /// supported version byte, and the "fully generated" flag bit clear.
    pub fn is_valid_generated(blob: &[u8]) -> bool {
        if blob.len() <= 2 {
            return false;
        }
        let version = blob[0];
        if !(25..=28).contains(&version) {
            return false;
        }
        blob[1] & 0x08 == 0
    }

    /// Reads the content id stored at node index `pos` directly out of the
    /// (already decompressed) node-data section, without materializing the
    /// full [`NodeArrays`].
    pub fn content_id_at(&self, pos: u16) -> Result<u16, MapblockError> {
        let idx = pos as usize * 2;
        if idx + 2 > self.node_data.len() {
            return Err(MapblockError::Malformed(
                "node position out of range".into(),
            ));
        }
        Ok(u16::from_be_bytes([self.node_data[idx], self.node_data[idx + 1]]))
    }

    pub fn deserialize_node_data(&self) -> Result<NodeArrays, MapblockError> {
        if self.node_data.len() < MAPBLOCK_SIZE * 4 {
            return Err(MapblockError::Malformed(
                "node data section too short".into(),
            ));
        }
        let mut content = Box::new([0u16; MAPBLOCK_SIZE]);
        for (i, chunk) in self.node_data[..MAPBLOCK_SIZE * 2].chunks_exact(2).enumerate() {
            content[i] = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        let mut param1 = Box::new([0u8; MAPBLOCK_SIZE]);
        param1.copy_from_slice(&self.node_data[MAPBLOCK_SIZE * 2..MAPBLOCK_SIZE * 3]);
        let mut param2 = Box::new([0u8; MAPBLOCK_SIZE]);
        param2.copy_from_slice(&self.node_data[MAPBLOCK_SIZE * 3..MAPBLOCK_SIZE * 4]);
        Ok(NodeArrays { content, param1, param2 })
    }

    pub fn serialize_node_data(&mut self, arrays: &NodeArrays) {
        let mut blob = Vec::with_capacity(MAPBLOCK_SIZE * 4);
        for &c in arrays.content.iter() {
            blob.extend_from_slice(&c.to_be_bytes());
        }
        blob.extend_from_slice(&arrays.param1[..]);
        blob.extend_from_slice(&arrays.param2[..]);
        self.node_data = blob;
    }

    pub fn deserialize_nimap(&self) -> Result<NameIdMap, MapblockError> {
        let mut list: Vec<Option<Vec<u8>>> = vec![None; self.nimap_count as usize];
        let mut data = self.nimap_raw.as_slice();
        for _ in 0..self.nimap_count {
            let id = read_u16_be(&mut data)?;
            let name_len = read_u16_be(&mut data)? as usize;
            let name = read_bytes(&mut data, name_len)?;
            let idx = id as usize;
            if idx >= list.len() {
                return Err(MapblockError::Malformed(format!(
                    "name-id map id {id} exceeds declared count {}",
                    self.nimap_count
                )));
            }
            list[idx] = Some(name);
        }
        list.into_iter()
            .enumerate()
            .map(|(i, n)| {
                n.ok_or_else(|| {
                    MapblockError::Malformed(format!(
                        "name-id map is missing id {i}; ids must cover a contiguous prefix"
                    ))
                })
            })
            .collect()
    }

    pub fn serialize_nimap(&mut self, nimap: &NameIdMap) {
        let mut blob = Vec::new();
        for (id, name) in nimap.iter().enumerate() {
            blob.extend_from_slice(&(id as u16).to_be_bytes());
            blob.extend_from_slice(&(name.len() as u16).to_be_bytes());
            blob.extend_from_slice(name);
        }
        self.nimap_count = nimap.len() as u16;
        self.nimap_raw = blob;
    }

    /// The node-metadata format version: 0 means no node on this block has
    /// metadata.
    pub fn metadata_version(&self) -> u8 {
        self.node_metadata[0]
    }

    pub fn deserialize_metadata(&self) -> Result<Vec<NodeMetadataRecord>, MapblockError> {
        let version = self.metadata_version();
        if version == 0 {
            return Ok(Vec::new());
        }
        if version > 2 {
            return Err(MapblockError::Malformed(format!(
                "unsupported node metadata version {version}"
            )));
        }

        let mut data = &self.node_metadata[1..];
        let count = read_u16_be(&mut data)?;
        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let pos = read_u16_be(&mut data)?;
            let num_vars = read_u32_be(&mut data)?;

            let vars_start = data;
            for _ in 0..num_vars {
                let key_len = read_u16_be(&mut data)? as usize;
                read_bytes(&mut data, key_len)?;
                let value_len = read_u32_be(&mut data)? as usize;
                read_bytes(&mut data, value_len)?;
                if version >= 2 {
                    read_u8(&mut data)?;
                }
            }
            let vars_len = vars_start.len() - data.len();
            let vars = vars_start[..vars_len].to_vec();

            const TERMINATOR: &[u8] = b"EndInventory\n";
            let term_pos = crate::byteio::find_subslice(data, TERMINATOR).ok_or_else(|| {
                MapblockError::Malformed(
                    "node metadata inventory missing EndInventory terminator".into(),
                )
            })?;
            let inv_len = term_pos + TERMINATOR.len();
            let inv = data[..inv_len].to_vec();
            data = &data[inv_len..];

            records.push(NodeMetadataRecord { pos, num_vars, vars, inv });
        }
        Ok(records)
    }

    /// Re-encodes the node-metadata section from `records`. `version` should
    /// come from a prior call to [`Mapblock::metadata_version`] on the same
    /// block (or the donor block, during a merge); when it is `0` but
    /// `records` is non-empty, version 2 is used instead, since a non-zero
    /// record count paired with a zero version tag is not a structurally
    /// valid mapblock.
    pub fn serialize_metadata(&mut self, records: &[NodeMetadataRecord], version: u8) {
        if records.is_empty() {
            self.node_metadata = vec![0];
            return;
        }
        let version = if version == 0 { 2 } else { version };

        let mut blob = Vec::new();
        blob.push(version);
        blob.extend_from_slice(&(records.len() as u16).to_be_bytes());
        for record in records {
            blob.extend_from_slice(&record.pos.to_be_bytes());
            blob.extend_from_slice(&record.num_vars.to_be_bytes());
            blob.extend_from_slice(&record.vars);
            blob.extend_from_slice(&record.inv);
        }
        self.node_metadata = blob;
    }

    pub fn deserialize_static_objects(&self) -> Result<Vec<StaticObjectRecord>, MapblockError> {
        let mut data = self.static_objects_raw.as_slice();
        let mut objects = Vec::with_capacity(self.static_object_count as usize);
        for _ in 0..self.static_object_count {
            let type_id = read_u8(&mut data)?;
            let pos: [u8; 12] = read_bytes(&mut data, 12)?.try_into().unwrap();
            let data_len = read_u16_be(&mut data)? as usize;
            let obj_data = read_bytes(&mut data, data_len)?;
            objects.push(StaticObjectRecord { type_id, pos, data: obj_data });
        }
        Ok(objects)
    }

    pub fn serialize_static_objects(&mut self, objects: &[StaticObjectRecord]) {
        let mut blob = Vec::new();
        for obj in objects {
            blob.push(obj.type_id);
            blob.extend_from_slice(&obj.pos);
            blob.extend_from_slice(&(obj.data.len() as u16).to_be_bytes());
            blob.extend_from_slice(&obj.data);
        }
        self.static_object_count = objects.len() as u16;
        self.static_objects_raw = blob;
    }

    pub fn deserialize_node_timers(&self) -> Result<Vec<NodeTimerRecord>, MapblockError> {
        let mut data = self.node_timers_raw.as_slice();
        let mut timers = Vec::with_capacity(self.node_timers_count as usize);
        for _ in 0..self.node_timers_count {
            let pos = read_u16_be(&mut data)?;
            let timeout = read_u32_be(&mut data)?;
            let elapsed = read_u32_be(&mut data)?;
            timers.push(NodeTimerRecord { pos, timeout, elapsed });
        }
        Ok(timers)
    }

    pub fn serialize_node_timers(&mut self, timers: &[NodeTimerRecord]) {
        let mut blob = Vec::new();
        for timer in timers {
            blob.extend_from_slice(&timer.pos.to_be_bytes());
            blob.extend_from_slice(&timer.timeout.to_be_bytes());
            blob.extend_from_slice(&timer.elapsed.to_be_bytes());
        }
        self.node_timers_count = timers.len() as u16;
        self.node_timers_raw = blob;
    }
}

/// Scans `count` fixed-prefix-then-variable-length records out of `data`
/// using `scan_one` (which must advance its cursor past exactly one
/// record), then slices and returns the raw bytes spanning all of them
/// while advancing `data` past them too.
fn read_length_walked(
    data: &mut &[u8],
    count: usize,
    scan_one: impl Fn(&mut &[u8]) -> Result<(), MapblockError>,
) -> Result<Vec<u8>, MapblockError> {
    let mut scan = *data;
    for _ in 0..count {
        scan_one(&mut scan)?;
    }
    let consumed = data.len() - scan.len();
    read_bytes(data, consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block(version: u8) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.push(version);
        blob.push(0); // flags
        if version >= 27 {
            blob.extend_from_slice(&0xFFFFu16.to_be_bytes());
        }
        blob.push(2); // content_width
        blob.push(2); // params_width

        let node_data = vec![0u8; MAPBLOCK_SIZE * 4];
        blob.extend_from_slice(&zlib_section::compress(&node_data));
        blob.extend_from_slice(&zlib_section::compress(&[0u8]));

        blob.push(0); // static object version
        blob.extend_from_slice(&0u16.to_be_bytes()); // static object count

        blob.extend_from_slice(&12345u32.to_be_bytes()); // timestamp

        blob.push(0); // nimap version
        blob.extend_from_slice(&1u16.to_be_bytes());
        blob.extend_from_slice(&0u16.to_be_bytes()); // id 0
        blob.extend_from_slice(&4u16.to_be_bytes()); // name len
        blob.extend_from_slice(b"air\0");

        blob.push(10); // timer record length
        blob.extend_from_slice(&0u16.to_be_bytes()); // timer count

        blob
    }

    #[test]
    fn parses_minimal_block_round_trip() {
        let blob = sample_block(28);
        let block = Mapblock::parse(&blob).unwrap();
        assert_eq!(block.version, 28);
        assert_eq!(block.timestamp, 12345);
        assert_eq!(block.metadata_version(), 0);
        assert!(block.deserialize_metadata().unwrap().is_empty());

        let nimap = block.deserialize_nimap().unwrap();
        assert_eq!(nimap.len(), 1);
        assert_eq!(nimap[0], b"air\0");

        let reserialized = block.serialize();
        let reparsed = Mapblock::parse(&reserialized).unwrap();
        assert_eq!(reparsed.timestamp, block.timestamp);
        assert_eq!(reparsed.deserialize_nimap().unwrap(), nimap);
    }

    #[test]
    fn rejects_bad_version() {
        let mut blob = sample_block(28);
        blob[0] = 12;
        assert!(matches!(
            Mapblock::parse(&blob),
            Err(MapblockError::UnsupportedVersion(12))
        ));
    }

    #[test]
    fn version_below_27_has_no_lighting_field() {
        let blob = sample_block(26);
        let block = Mapblock::parse(&blob).unwrap();
        assert_eq!(block.lighting_complete, 0xFFFF);
    }

    #[test]
    fn content_id_at_reads_without_full_decode() {
        let blob = sample_block(28);
        let block = Mapblock::parse(&blob).unwrap();
        assert_eq!(block.content_id_at(0).unwrap(), 0);
    }

    #[test]
    fn is_valid_generated_rejects_short_or_flagged_blobs() {
        assert!(!Mapblock::is_valid_generated(&[]));
        assert!(!Mapblock::is_valid_generated(&[28]));
        assert!(Mapblock::is_valid_generated(&[28, 0, 0, 0]));
        assert!(!Mapblock::is_valid_generated(&[28, 0x08, 0, 0]));
    }
}
