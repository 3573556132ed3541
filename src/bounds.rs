//! Bounding rectangle over positioned map chunks

use crate::models::MapChunk;

/// The tile-space rectangle spanning a set of positioned chunks.
///
/// `min_*` is inclusive, `max_*` exclusive: a single 4x4 chunk at the origin
/// yields `min = (0, 0)`, `max = (4, 4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl GridBounds {
    /// Width of the merged grid in tiles.
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x) as u32
    }

    /// Height of the merged grid in tiles.
    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y) as u32
    }
}

/// Compute the bounding rectangle of a set of chunks.
///
/// Returns `None` for an empty slice; the merge orchestrator maps that to
/// its no-input error.
pub fn chunk_bounds(chunks: &[MapChunk]) -> Option<GridBounds> {
    let first = chunks.first()?;
    let mut bounds = GridBounds {
        min_x: first.offset_x,
        min_y: first.offset_y,
        max_x: first.offset_x + first.document.width as i32,
        max_y: first.offset_y + first.document.height as i32,
    };

    for chunk in &chunks[1..] {
        bounds.min_x = bounds.min_x.min(chunk.offset_x);
        bounds.min_y = bounds.min_y.min(chunk.offset_y);
        bounds.max_x = bounds.max_x.max(chunk.offset_x + chunk.document.width as i32);
        bounds.max_y = bounds.max_y.max(chunk.offset_y + chunk.document.height as i32);
    }

    Some(bounds)
}
