//! Palette extraction - reduce a raster to its dominant colors
//!
//! Pixels are sampled on a stride and binned into coarse 4-bit-per-channel
//! buckets; the top buckets by population become the palette. Cheap and
//! good enough for tileset art, where colors are flat to begin with.

use image::{Rgba, RgbaImage};
use std::collections::HashMap;

/// Default sampling stride in both axes.
pub const DEFAULT_SAMPLE_STEP: u32 = 4;

/// Collapse a channel value to its high 4 bits.
fn bucket(value: u8) -> u8 {
    value >> 4
}

/// Expand a 4-bit bucket back to a representative full-range value.
fn expand(bucket: u8) -> u8 {
    (bucket << 4) | bucket
}

/// Extract up to `max_colors` representative colors from an image, most
/// frequent first.
///
/// Pixels are visited row-major at `sample_step` intervals in both axes;
/// fully transparent pixels are ignored. Ties in frequency resolve to the
/// bucket encountered first in scan order. Fewer distinct buckets than
/// `max_colors` yields a shorter result - never an error.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use mapstitch::palette::extract_palette;
///
/// let image = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
/// let palette = extract_palette(&image, 4, 1);
/// assert_eq!(palette, vec![Rgba([255, 0, 0, 255])]);
/// ```
pub fn extract_palette(image: &RgbaImage, max_colors: usize, sample_step: u32) -> Vec<Rgba<u8>> {
    let step = sample_step.max(1);
    let mut counts: HashMap<[u8; 4], (u64, usize)> = HashMap::new();
    let mut order = 0usize;

    let mut y = 0;
    while y < image.height() {
        let mut x = 0;
        while x < image.width() {
            let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
            if a != 0 {
                let key = [bucket(r), bucket(g), bucket(b), bucket(a)];
                let entry = counts.entry(key).or_insert_with(|| {
                    let entry = (0, order);
                    order += 1;
                    entry
                });
                entry.0 += 1;
            }
            x += step;
        }
        y += step;
    }

    let mut ranked: Vec<([u8; 4], (u64, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    ranked
        .into_iter()
        .take(max_colors)
        .map(|([r, g, b, a], _)| Rgba([expand(r), expand(g), expand(b), expand(a)]))
        .collect()
}
