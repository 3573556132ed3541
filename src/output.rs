//! Output - PNG and map JSON writing, bundle export

use crate::models::MapDocument;
use crate::renderer::RasterCatalog;
use image::RgbaImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// Document serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Save an RGBA image to a PNG file, creating parent directories as needed.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    ensure_parent(path)?;
    image.save(path)?;
    Ok(())
}

/// Write a map document as pretty-printed JSON.
pub fn write_map_json(doc: &MapDocument, path: &Path) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), doc)?;
    Ok(())
}

/// Export a map and its tileset art as a self-contained directory.
///
/// Writes `map.json` plus one PNG per tileset whose raster the catalog can
/// resolve, rewriting each packaged tileset's `image` field to the bundled
/// basename so the exported map is portable. Tilesets without an available
/// raster keep their original `image` reference.
///
/// Returns the path of the written map document.
pub fn export_bundle(
    doc: &MapDocument,
    catalog: &RasterCatalog,
    dir: &Path,
) -> Result<PathBuf, OutputError> {
    std::fs::create_dir_all(dir)?;

    let mut bundled = doc.clone();
    for ts in &mut bundled.tilesets {
        let Some(raster) = catalog.raster_for(ts) else {
            continue;
        };
        let basename = ts
            .image
            .as_deref()
            .and_then(|image| Path::new(image).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .or_else(|| ts.name.as_ref().map(|name| format!("{}.png", name)));
        let Some(basename) = basename else {
            continue;
        };

        save_png(raster, &dir.join(&basename))?;
        ts.image = Some(basename);
    }

    let map_path = dir.join("map.json");
    write_map_json(&bundled, &map_path)?;
    Ok(map_path)
}
