//! Inner encodings nested inside a mapblock's node-metadata and
//! static-object sections: per-position metadata variables, and the
//! embedded entity name/data pair of a static object.

use crate::byteio::{read_bytes, read_u16_be, read_u32_be, read_u8};
use crate::error::MapblockError;

/// An ordered key -> (value, is_private) mapping, as found in one node's
/// metadata record.
///
/// Preserves insertion order the way the dict these are modeled on does;
/// re-inserting an existing key updates its value in place rather than
/// moving it to the end of iteration order.
#[derive(Debug, Clone, Default)]
pub struct MetaVars(Vec<(Vec<u8>, Vec<u8>, u8)>);

impl MetaVars {
    pub fn new() -> Self {
        MetaVars(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.0.iter().any(|(k, _, _)| k.as_slice() == key)
    }

    pub fn value(&self, key: &[u8]) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|(k, _, _)| k.as_slice() == key)
            .map(|(_, v, _)| v.as_slice())
    }

    /// Replaces the value of an existing key, preserving its `is_private`
    /// flag and its position in iteration order. Returns `false` if the key
    /// was absent.
    pub fn set_value(&mut self, key: &[u8], value: Vec<u8>) -> bool {
        match self.0.iter_mut().find(|(k, _, _)| k.as_slice() == key) {
            Some(entry) => {
                entry.1 = value;
                true
            }
            None => false,
        }
    }

    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>, is_private: u8) {
        match self.0.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => *entry = (key, value, is_private),
            None => self.0.push((key, value, is_private)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8], u8)> {
        self.0.iter().map(|(k, v, p)| (k.as_slice(), v.as_slice(), *p))
    }
}

/// Decodes the `num_vars` key/value records stored in a node metadata
/// record's `vars` blob.
pub fn deserialize_metadata_vars(
    blob: &[u8],
    count: u32,
    meta_version: u8,
) -> Result<MetaVars, MapblockError> {
    let mut data = blob;
    let mut vars = MetaVars::new();
    for _ in 0..count {
        let key_len = read_u16_be(&mut data)? as usize;
        let key = read_bytes(&mut data, key_len)?;
        let value_len = read_u32_be(&mut data)? as usize;
        let value = read_bytes(&mut data, value_len)?;
        let is_private = if meta_version >= 2 { read_u8(&mut data)? } else { 0 };
        vars.insert(key, value, is_private);
    }
    Ok(vars)
}

pub fn serialize_metadata_vars(vars: &MetaVars, meta_version: u8) -> Vec<u8> {
    let mut blob = Vec::new();
    for (key, value, is_private) in vars.iter() {
        blob.extend_from_slice(&(key.len() as u16).to_be_bytes());
        blob.extend_from_slice(key);
        blob.extend_from_slice(&(value.len() as u32).to_be_bytes());
        blob.extend_from_slice(value);
        if meta_version >= 2 {
            blob.push(is_private);
        }
    }
    blob
}

/// An entity's serialized name and inner state, as embedded in a
/// [`crate::mapblock::StaticObjectRecord`]'s `data` field.
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

pub fn deserialize_object_data(blob: &[u8]) -> Result<ObjectData, MapblockError> {
    let mut data = blob;
    read_u8(&mut data)?; // version byte, unused
    let name_len = read_u16_be(&mut data)? as usize;
    let name = read_bytes(&mut data, name_len)?;
    let data_len = read_u32_be(&mut data)? as usize;
    let inner = read_bytes(&mut data, data_len)?;
    Ok(ObjectData { name, data: inner })
}
