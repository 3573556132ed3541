//! Map merge orchestrator
//!
//! Validates a set of positioned chunks, then drives bounds, tileset
//! registry and layer compositing to assemble one merged document. All
//! validation failures abort the merge before any output exists.

use crate::bounds::chunk_bounds;
use crate::compositor::{merge_object_groups, merge_tile_layers, MergeCounters};
use crate::models::{MapChunk, MapDocument};
use crate::registry::merge_tilesets;
use thiserror::Error;

/// Error type for merge validation failures.
///
/// Each precondition gets its own variant so callers can report "maps have
/// inconsistent tile size" and "infinite maps unsupported" as distinct
/// failures instead of one generic fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// No chunks were given
    #[error("no maps to merge")]
    NoInput,
    /// A chunk's tile pixel size differs from the first chunk's
    #[error(
        "map '{chunk}' has tile size {found_width}x{found_height}, \
         expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        chunk: String,
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },
    /// A chunk declares an unbounded (infinite) layout
    #[error("map '{chunk}' is an infinite map, which is unsupported")]
    InfiniteMap { chunk: String },
}

/// Merge positioned chunks into one map document.
///
/// The first chunk's document is the template: orientation, render order,
/// custom properties and any unrecognized fields carry over from it, while
/// geometry, layers and tilesets are recomputed. Merged tile layers always
/// precede merged object groups in the output layer stack.
///
/// # Errors
///
/// - [`MergeError::NoInput`] when `chunks` is empty
/// - [`MergeError::DimensionMismatch`] when tile pixel sizes differ
/// - [`MergeError::InfiniteMap`] when any chunk declares `infinite`
pub fn merge(chunks: &[MapChunk]) -> Result<MapDocument, MergeError> {
    let first = chunks.first().ok_or(MergeError::NoInput)?;
    let (tile_width, tile_height) = (first.document.tilewidth, first.document.tileheight);

    for chunk in chunks {
        if chunk.document.tilewidth != tile_width || chunk.document.tileheight != tile_height {
            return Err(MergeError::DimensionMismatch {
                chunk: chunk.id.clone(),
                expected_width: tile_width,
                expected_height: tile_height,
                found_width: chunk.document.tilewidth,
                found_height: chunk.document.tileheight,
            });
        }
        if chunk.document.infinite {
            return Err(MergeError::InfiniteMap { chunk: chunk.id.clone() });
        }
    }

    // Guarded by the NoInput check above
    let bounds = chunk_bounds(chunks).ok_or(MergeError::NoInput)?;
    let merged_tilesets = merge_tilesets(chunks);

    let mut counters = MergeCounters::default();
    let mut layers = merge_tile_layers(chunks, bounds, &merged_tilesets.remaps, &mut counters);
    layers.extend(merge_object_groups(
        chunks,
        bounds,
        &merged_tilesets.remaps,
        &mut counters,
    ));

    let mut merged = first.document.clone();
    merged.width = bounds.width();
    merged.height = bounds.height();
    merged.layers = layers;
    merged.tilesets = merged_tilesets.tilesets;
    merged.nextlayerid = Some(counters.next_layer_id());
    merged.nextobjectid = Some(counters.next_object_id());
    Ok(merged)
}
