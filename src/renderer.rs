//! Map rendering - paints a composed raster from tile layers and tileset art
//!
//! Rendering is best effort: an unresolvable tileset, a missing raster or a
//! cell outside its tileset's art skips that cell with a warning, never the
//! whole render.

use crate::models::{Layer, MapDocument, TileLayer, TilesetRef};
use crate::registry::GID_MASK;
use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A warning generated during rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Tileset art lookup, keyed by image basename with a tileset-name fallback.
///
/// Keys are matched case-insensitively. Registering `"art/Terrain.PNG"`
/// makes the raster reachable as `terrain.png`, `terrain`, or by a tileset
/// whose `name` is `Terrain`.
#[derive(Debug, Default)]
pub struct RasterCatalog {
    rasters: Vec<RgbaImage>,
    by_key: HashMap<String, usize>,
}

fn normalize(key: &str) -> String {
    Path::new(key)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| key.to_lowercase())
}

fn stem(key: &str) -> Option<String> {
    Path::new(key).file_stem().map(|s| s.to_string_lossy().to_lowercase())
}

impl RasterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster under a path or bare name.
    pub fn insert(&mut self, key: &str, image: RgbaImage) {
        let index = self.rasters.len();
        self.rasters.push(image);
        self.by_key.insert(normalize(key), index);
        if let Some(stem) = stem(key) {
            self.by_key.entry(stem).or_insert(index);
        }
    }

    /// Resolve a tileset's raster by image basename, then stem, then name.
    pub fn raster_for(&self, ts: &TilesetRef) -> Option<&RgbaImage> {
        let image_key = ts.image.as_deref().map(normalize);
        let image_stem = ts.image.as_deref().and_then(stem);
        let name_key = ts.name.as_deref().map(|n| n.to_lowercase());

        [image_key, image_stem, name_key]
            .into_iter()
            .flatten()
            .find_map(|key| self.by_key.get(&key))
            .map(|&index| &self.rasters[index])
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }
}

/// Find the tileset owning a gid: the one with the largest `firstgid` not
/// exceeding it. The declared `tilecount` upper bound is deliberately not
/// checked; a cell past the end of its tileset's art just paints nothing.
fn owning_tileset(tilesets: &[TilesetRef], gid: u32) -> Option<&TilesetRef> {
    tilesets
        .iter()
        .filter(|ts| ts.firstgid <= gid)
        .max_by_key(|ts| ts.firstgid)
}

/// Render a map document to a raster sized `width*tilewidth x height*tileheight`.
///
/// The output starts fully transparent. Later layers draw over earlier
/// ones; fully transparent source texels leave the pixels beneath visible.
/// Invisible layers are skipped, group layers are walked recursively, and
/// image layers are ignored (their art is not tile-addressed).
pub fn render_map(doc: &MapDocument, catalog: &RasterCatalog) -> (RgbaImage, Vec<Warning>) {
    let mut dest = RgbaImage::new(doc.width * doc.tilewidth, doc.height * doc.tileheight);
    let mut warnings = Vec::new();
    let mut warned: HashSet<String> = HashSet::new();

    render_layers(doc, &doc.layers, catalog, &mut dest, &mut warnings, &mut warned);

    (dest, warnings)
}

fn render_layers(
    doc: &MapDocument,
    layers: &[Layer],
    catalog: &RasterCatalog,
    dest: &mut RgbaImage,
    warnings: &mut Vec<Warning>,
    warned: &mut HashSet<String>,
) {
    for layer in layers {
        if !layer.visible() {
            continue;
        }
        match layer {
            Layer::Tile(tile_layer) => {
                render_tile_layer(doc, tile_layer, catalog, dest, warnings, warned);
            }
            Layer::Group(group) => {
                render_layers(doc, &group.layers, catalog, dest, warnings, warned);
            }
            Layer::Object(_) | Layer::Image(_) => {}
        }
    }
}

fn render_tile_layer(
    doc: &MapDocument,
    layer: &TileLayer,
    catalog: &RasterCatalog,
    dest: &mut RgbaImage,
    warnings: &mut Vec<Warning>,
    warned: &mut HashSet<String>,
) {
    for y in 0..layer.height.min(doc.height) {
        for x in 0..layer.width.min(doc.width) {
            let raw = match layer.data.get((y * layer.width + x) as usize) {
                Some(&raw) if raw != 0 => raw,
                _ => continue,
            };
            let gid = raw & GID_MASK;

            let Some(ts) = owning_tileset(&doc.tilesets, gid) else {
                if warned.insert(format!("gid:{}", gid)) {
                    warnings.push(Warning::new(format!(
                        "No tileset owns gid {}, skipping its cells",
                        gid
                    )));
                }
                continue;
            };

            let label = ts
                .name
                .clone()
                .or_else(|| ts.image.clone())
                .unwrap_or_else(|| format!("firstgid {}", ts.firstgid));

            let (Some(columns), Some(tile_width), Some(tile_height)) =
                (ts.columns, ts.tilewidth, ts.tileheight)
            else {
                if warned.insert(format!("meta:{}", label)) {
                    warnings.push(Warning::new(format!(
                        "Tileset '{}' lacks columns or tile dimensions, skipping its cells",
                        label
                    )));
                }
                continue;
            };
            if columns == 0 || tile_width == 0 || tile_height == 0 {
                continue;
            }

            let Some(raster) = catalog.raster_for(ts) else {
                if warned.insert(format!("raster:{}", label)) {
                    warnings.push(Warning::new(format!(
                        "No raster available for tileset '{}', skipping its cells",
                        label
                    )));
                }
                continue;
            };

            let index = gid - ts.firstgid;
            let src_x = (index % columns) * tile_width;
            let src_y = (index / columns) * tile_height;

            blit_tile(
                raster,
                src_x,
                src_y,
                tile_width,
                tile_height,
                dest,
                x * doc.tilewidth,
                y * doc.tileheight,
                doc.tilewidth,
                doc.tileheight,
            );
        }
    }
}

/// Nearest-neighbor blit of one tile, scaled from the tileset's tile size to
/// the destination's. Source pixels outside the raster and fully transparent
/// texels are skipped.
fn blit_tile(
    raster: &RgbaImage,
    src_x: u32,
    src_y: u32,
    src_width: u32,
    src_height: u32,
    dest: &mut RgbaImage,
    dest_x: u32,
    dest_y: u32,
    dest_width: u32,
    dest_height: u32,
) {
    for dy in 0..dest_height {
        for dx in 0..dest_width {
            let sx = src_x + dx * src_width / dest_width;
            let sy = src_y + dy * src_height / dest_height;
            if sx >= raster.width() || sy >= raster.height() {
                continue;
            }
            let pixel = *raster.get_pixel(sx, sy);
            if pixel.0[3] == 0 {
                continue;
            }
            dest.put_pixel(dest_x + dx, dest_y + dy, pixel);
        }
    }
}
