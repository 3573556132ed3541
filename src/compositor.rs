//! Layer compositing - rewrites chunk layers into the merged coordinate space
//!
//! Both entry points are pure over `(chunks, bounds, remaps)`; the id
//! counters are per-merge state threaded in by the orchestrator, never
//! process-wide.

use crate::bounds::GridBounds;
use crate::models::{Layer, MapChunk, ObjectGroup, TileLayer};
use crate::registry::GidRemap;

/// Fresh id sequences for one merge invocation.
///
/// Layer ids and object ids are renumbered from 1 in emission order across
/// the whole merged document.
#[derive(Debug, Clone)]
pub struct MergeCounters {
    next_layer_id: u32,
    next_object_id: u32,
}

impl Default for MergeCounters {
    fn default() -> Self {
        Self { next_layer_id: 1, next_object_id: 1 }
    }
}

impl MergeCounters {
    fn next_layer(&mut self) -> u32 {
        let id = self.next_layer_id;
        self.next_layer_id += 1;
        id
    }

    fn next_object(&mut self) -> u32 {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }

    /// The id the next layer would receive (exported into `nextlayerid`).
    pub fn next_layer_id(&self) -> u32 {
        self.next_layer_id
    }

    /// The id the next object would receive (exported into `nextobjectid`).
    pub fn next_object_id(&self) -> u32 {
        self.next_object_id
    }
}

/// Rewrite every chunk's tile layers onto grids sized to the merged bounds.
///
/// Each source layer becomes its own destination layer - layers are
/// juxtaposed in the output stack, never blended. Cells landing outside the
/// bounds are dropped silently.
pub fn merge_tile_layers(
    chunks: &[MapChunk],
    bounds: GridBounds,
    remaps: &[GidRemap],
    counters: &mut MergeCounters,
) -> Vec<Layer> {
    let dest_width = bounds.width();
    let dest_height = bounds.height();
    let mut merged = Vec::new();

    for (chunk, remap) in chunks.iter().zip(remaps) {
        let shift_x = chunk.offset_x - bounds.min_x;
        let shift_y = chunk.offset_y - bounds.min_y;

        for layer in &chunk.document.layers {
            let src = match layer {
                Layer::Tile(src) => src,
                _ => continue,
            };

            let mut data = vec![0u32; (dest_width * dest_height) as usize];
            for local_y in 0..src.height {
                for local_x in 0..src.width {
                    let index = (local_y * src.width + local_x) as usize;
                    let gid = src.data.get(index).copied().unwrap_or(0);
                    if gid == 0 {
                        continue;
                    }
                    let dest_x = shift_x + local_x as i32;
                    let dest_y = shift_y + local_y as i32;
                    if dest_x < 0
                        || dest_y < 0
                        || dest_x >= dest_width as i32
                        || dest_y >= dest_height as i32
                    {
                        continue;
                    }
                    let dest_index = (dest_y as u32 * dest_width + dest_x as u32) as usize;
                    data[dest_index] = remap.apply(gid);
                }
            }

            merged.push(Layer::Tile(TileLayer {
                id: counters.next_layer(),
                name: src.name.clone(),
                x: 0,
                y: 0,
                width: dest_width,
                height: dest_height,
                data,
                opacity: src.opacity,
                visible: src.visible,
                properties: src.properties.clone(),
                extra: src.extra.clone(),
            }));
        }
    }

    merged
}

/// Rewrite every chunk's object groups into merged pixel coordinates.
///
/// Objects keep their pixel positions relative to their chunk, shifted by
/// the chunk's tile offset times the tile size. No clipping - objects may
/// legitimately sit outside the nominal grid.
pub fn merge_object_groups(
    chunks: &[MapChunk],
    bounds: GridBounds,
    remaps: &[GidRemap],
    counters: &mut MergeCounters,
) -> Vec<Layer> {
    let mut merged = Vec::new();

    for (chunk, remap) in chunks.iter().zip(remaps) {
        let shift_x =
            ((chunk.offset_x - bounds.min_x) * chunk.document.tilewidth as i32) as f64;
        let shift_y =
            ((chunk.offset_y - bounds.min_y) * chunk.document.tileheight as i32) as f64;

        for layer in &chunk.document.layers {
            let src = match layer {
                Layer::Object(src) => src,
                _ => continue,
            };

            let objects = src
                .objects
                .iter()
                .map(|object| {
                    let mut object = object.clone();
                    object.id = counters.next_object();
                    object.x += shift_x;
                    object.y += shift_y;
                    object.gid = object.gid.map(|gid| remap.apply(gid));
                    object
                })
                .collect();

            merged.push(Layer::Object(ObjectGroup {
                id: counters.next_layer(),
                name: src.name.clone(),
                objects,
                opacity: src.opacity,
                visible: src.visible,
                properties: src.properties.clone(),
                extra: src.extra.clone(),
            }));
        }
    }

    merged
}
