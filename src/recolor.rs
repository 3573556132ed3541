//! Palette recoloring - substitute colors across a raster
//!
//! Changes are an ordered list; order is significant. In exact mode the
//! first change whose `from` equals the pixel wins. In tolerance mode the
//! nearest `from` wins, with earlier-listed changes winning distance ties.

use crate::color::distance_sq;
use image::{Rgba, RgbaImage};

/// Default squared-distance budget for tolerance matching (20 per channel).
pub const DEFAULT_TOLERANCE_SQ: u32 = 400;

/// A declared substitution of one color for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteChange {
    pub from: Rgba<u8>,
    pub to: Rgba<u8>,
}

/// How pixels are matched against a change's `from` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Replace only pixels exactly equal to a `from` color.
    #[default]
    Exact,
    /// Replace pixels whose nearest `from` is within the squared-distance budget.
    Tolerance { max_distance_sq: u32 },
}

/// Apply palette changes to an image, returning a new buffer.
///
/// The input is never mutated. Fully transparent pixels pass through
/// untouched, as do pixels no change matches. Output dimensions and layout
/// equal the input's.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use mapstitch::recolor::{apply_changes, MatchMode, PaletteChange};
///
/// let base = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
/// let changes = [PaletteChange { from: Rgba([255, 0, 0, 255]), to: Rgba([0, 255, 0, 255]) }];
/// let result = apply_changes(&base, &changes, MatchMode::Exact);
/// assert_eq!(*result.get_pixel(0, 0), Rgba([0, 255, 0, 255]));
/// ```
pub fn apply_changes(
    base: &RgbaImage,
    changes: &[PaletteChange],
    mode: MatchMode,
) -> RgbaImage {
    let mut result = base.clone();

    for pixel in result.pixels_mut() {
        if pixel.0[3] == 0 {
            continue;
        }
        if let Some(to) = match_pixel(*pixel, changes, mode) {
            *pixel = to;
        }
    }

    result
}

/// Find the replacement for one pixel, if any change matches.
fn match_pixel(
    pixel: Rgba<u8>,
    changes: &[PaletteChange],
    mode: MatchMode,
) -> Option<Rgba<u8>> {
    match mode {
        MatchMode::Exact => changes.iter().find(|c| c.from == pixel).map(|c| c.to),
        MatchMode::Tolerance { max_distance_sq } => {
            let mut best: Option<(u32, Rgba<u8>)> = None;
            for change in changes {
                let d = distance_sq(pixel, change.from);
                // Strict less-than keeps the earliest change on ties
                if best.map_or(true, |(best_d, _)| d < best_d) {
                    best = Some((d, change.to));
                }
            }
            best.filter(|&(d, _)| d <= max_distance_sq).map(|(_, to)| to)
        }
    }
}
