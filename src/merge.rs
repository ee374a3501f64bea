//! The region-scoped merge engine: compose fragments of one or more layer
//! mapblocks onto a base mapblock, remapping name-id indices, metadata and
//! timers as it goes.

use crate::error::MapblockError;
use crate::geometry::{Area, Vec3, MAPBLOCK_SIZE};
use crate::mapblock::{Mapblock, NameIdMap};

struct Layer {
    block: Mapblock,
    from_area: Area,
    to_area: Area,
}

/// Accumulates layers to merge onto a base block.
///
/// `from_area` and `to_area` for each layer must have equal extent on every
/// axis (they describe the same box, just anchored differently); the merge
/// copies `from_area` of the layer onto `to_area` of the base.
pub struct Merge {
    base: Mapblock,
    layers: Vec<Layer>,
}

impl Merge {
    pub fn new(base: Mapblock) -> Self {
        Merge { base, layers: Vec::new() }
    }

    pub fn add_layer(&mut self, block: Mapblock, from_area: Area, to_area: Area) {
        self.layers.push(Layer { block, from_area, to_area });
    }

    /// Runs the merge, consuming `self` and returning the rewritten base
    /// block.
    pub fn merge(self) -> Result<Mapblock, MapblockError> {
        let mut base = self.base;

        let mut base_arrays = base.deserialize_node_data()?;
        let mut base_nimap = base.deserialize_nimap()?;
        let base_metadata_version = base.metadata_version();
        let mut base_metadata = base.deserialize_metadata()?;
        let mut base_timers = base.deserialize_node_timers()?;

        for layer in &self.layers {
            let layer_arrays = layer.block.deserialize_node_data()?;
            let layer_nimap = layer.block.deserialize_nimap()?;

            let id_offset = base_nimap.len() as u16;
            base_nimap.extend(layer_nimap);

            copy_box(&mut base_arrays.content, &layer_arrays.content, layer.from_area, layer.to_area, |v| {
                v.wrapping_add(id_offset)
            });
            copy_box(&mut base_arrays.param1, &layer_arrays.param1, layer.from_area, layer.to_area, |v| v);
            copy_box(&mut base_arrays.param2, &layer_arrays.param2, layer.from_area, layer.to_area, |v| v);

            let area_offset = layer.to_area.p1 - layer.from_area.p1;

            base_metadata.retain(|m| !layer.to_area.contains(Vec3::from_u16_key(m.pos)));

            let layer_metadata = layer.block.deserialize_metadata()?;
            for mut record in layer_metadata {
                let pos = Vec3::from_u16_key(record.pos);
                if layer.from_area.contains(pos) {
                    record.pos = (pos + area_offset).to_u16_key();
                    base_metadata.push(record);
                }
            }

            base_timers.retain(|t| !layer.to_area.contains(Vec3::from_u16_key(t.pos)));
        }

        clean_nimap(&mut base_nimap, &mut base_arrays.content);

        base.serialize_node_data(&base_arrays);
        base.serialize_nimap(&base_nimap);
        base.serialize_metadata(&base_metadata, base_metadata_version);
        base.serialize_node_timers(&base_timers);

        Ok(base)
    }
}

/// Copies `from_area` of `src` onto `to_area` of `dst`, applying `transform`
/// to each copied value. The two areas must have equal extent on every
/// axis.
fn copy_box<T: Copy>(
    dst: &mut [T; MAPBLOCK_SIZE],
    src: &[T; MAPBLOCK_SIZE],
    from_area: Area,
    to_area: Area,
    mut transform: impl FnMut(T) -> T,
) {
    let (from_z, from_y, from_x) = from_area.to_array_slices();
    let (to_z, to_y, to_x) = to_area.to_array_slices();

    for (zi, dz) in to_z.enumerate() {
        let sz = from_z.start + zi;
        for (yi, dy) in to_y.clone().enumerate() {
            let sy = from_y.start + yi;
            for (xi, dx) in to_x.clone().enumerate() {
                let sx = from_x.start + xi;
                let dst_idx = dx + 16 * dy + 256 * dz;
                let src_idx = sx + 16 * sy + 256 * sz;
                dst[dst_idx] = transform(src[src_idx]);
            }
        }
    }
}

/// Removes unused or duplicate name-id mappings, remapping `content` in
/// place as entries are folded together or dropped.
///
/// Iterates ids from highest to lowest: each removal only ever shifts
/// already-visited higher ids down, never the one about to be visited next.
pub fn clean_nimap(nimap: &mut NameIdMap, content: &mut [u16; MAPBLOCK_SIZE]) {
    let mut id = nimap.len();
    while id > 0 {
        id -= 1;
        let id16 = id as u16;

        let first_occur = nimap.iter().position(|name| name == &nimap[id]).unwrap();
        let mut delete = false;

        if first_occur < id {
            for c in content.iter_mut() {
                if *c == id16 {
                    *c = first_occur as u16;
                }
            }
            delete = true;
        }

        if delete || !content.iter().any(|&c| c == id16) {
            nimap.remove(id);
            for c in content.iter_mut() {
                if *c > id16 {
                    *c -= 1;
                }
            }
        }
    }
}
