//! Command-line interface implementation

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::color::{format_color, parse_color};
use crate::merge::merge;
use crate::models::MapChunk;
use crate::output::{export_bundle, save_png, write_map_json};
use crate::palette::{extract_palette, DEFAULT_SAMPLE_STEP};
use crate::parser::read_document;
use crate::recolor::{apply_changes, MatchMode, PaletteChange};
use crate::renderer::{render_map, RasterCatalog};

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Mapstitch - merge tile-grid maps and recolor their tilesets
#[derive(Parser)]
#[command(name = "stitch")]
#[command(about = "Mapstitch - merge tile-grid maps and recolor their tilesets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge positioned map documents into one map
    Merge {
        /// Input maps as PATH or PATH@X,Y (tile offset, default 0,0)
        #[arg(required = true)]
        maps: Vec<String>,

        /// Output path for the merged map document
        #[arg(short, long, default_value = "merged.json")]
        output: PathBuf,

        /// Directory of tileset PNGs, used with --bundle
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Export a self-contained bundle (map.json + tileset art) to this directory
        #[arg(long)]
        bundle: Option<PathBuf>,
    },

    /// Extract the dominant colors of an image
    Palette {
        /// Input PNG image
        input: PathBuf,

        /// Maximum number of colors to report
        #[arg(short, long, default_value_t = 8)]
        colors: usize,

        /// Sampling stride in pixels
        #[arg(long, default_value_t = DEFAULT_SAMPLE_STEP)]
        step: u32,
    },

    /// Apply palette substitutions to one or more images
    Recolor {
        /// Input PNG images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// JSON file of changes: [{"from": "#FF0000", "to": "#00FF00"}, ...]
        #[arg(short, long)]
        changes: PathBuf,

        /// Match colors within a squared-distance budget instead of exactly
        #[arg(long, num_args = 0..=1, default_missing_value = "400")]
        tolerance: Option<u32>,

        /// Output directory. If omitted: {input}_recolored.png next to each input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a map document to a PNG
    Render {
        /// Input map document
        map: PathBuf,

        /// Directories of tileset PNGs
        #[arg(long)]
        assets: Vec<PathBuf>,

        /// Output PNG path. If omitted: {map}.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Strict mode: treat render warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge { maps, output, assets, bundle } => {
            run_merge(&maps, &output, assets.as_deref(), bundle.as_deref())
        }
        Commands::Palette { input, colors, step } => run_palette(&input, colors, step),
        Commands::Recolor { inputs, changes, tolerance, output } => {
            run_recolor(&inputs, &changes, tolerance, output.as_deref())
        }
        Commands::Render { map, assets, output, strict } => {
            run_render(&map, &assets, output.as_deref(), strict)
        }
    }
}

/// One entry of a palette-change file.
#[derive(Debug, Deserialize)]
struct ChangeSpec {
    from: String,
    to: String,
}

/// Parse `PATH` or `PATH@X,Y` into a positioned chunk argument.
fn parse_map_arg(arg: &str) -> Result<(PathBuf, i32, i32), String> {
    let Some((path, offsets)) = arg.rsplit_once('@') else {
        return Ok((PathBuf::from(arg), 0, 0));
    };
    let Some((x, y)) = offsets.split_once(',') else {
        return Err(format!("'{}': expected PATH@X,Y", arg));
    };
    let x = x.trim().parse::<i32>().map_err(|_| format!("'{}': bad X offset", arg))?;
    let y = y.trim().parse::<i32>().map_err(|_| format!("'{}': bad Y offset", arg))?;
    Ok((PathBuf::from(path), x, y))
}

fn execute_merge(maps: &[String]) -> Result<crate::models::MapDocument, String> {
    let mut chunks = Vec::with_capacity(maps.len());
    for arg in maps {
        let (path, x, y) = parse_map_arg(arg)?;
        let doc = read_document(&path).map_err(|e| e.to_string())?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        chunks.push(MapChunk::at(id, doc, x, y));
    }
    merge(&chunks).map_err(|e| e.to_string())
}

fn run_merge(
    maps: &[String],
    output: &Path,
    assets: Option<&Path>,
    bundle: Option<&Path>,
) -> ExitCode {
    let merged = match execute_merge(maps) {
        Ok(merged) => merged,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Err(e) = write_map_json(&merged, output) {
        eprintln!("Error: cannot write '{}': {}", output.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    println!(
        "Merged {} maps into '{}' ({}x{} tiles, {} tilesets)",
        maps.len(),
        output.display(),
        merged.width,
        merged.height,
        merged.tilesets.len()
    );

    if let Some(bundle_dir) = bundle {
        let catalog = match assets {
            Some(assets_dir) => match load_catalog(&[assets_dir.to_path_buf()]) {
                Ok(catalog) => catalog,
                Err(message) => {
                    eprintln!("Error: {}", message);
                    return ExitCode::from(EXIT_ERROR);
                }
            },
            None => {
                eprintln!("Error: --bundle requires --assets");
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        };
        match export_bundle(&merged, &catalog, bundle_dir) {
            Ok(map_path) => println!("Bundled map and art into '{}'", map_path.display()),
            Err(e) => {
                eprintln!("Error: cannot export bundle: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn run_palette(input: &Path, colors: usize, step: u32) -> ExitCode {
    let image = match image::open(input) {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
            eprintln!("Error: cannot open image '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    for color in extract_palette(&image, colors, step) {
        println!("{}", format_color(color));
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Load and parse a palette-change file.
fn load_changes(path: &Path) -> Result<Vec<PaletteChange>, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let specs: Vec<ChangeSpec> = serde_json::from_str(&json)
        .map_err(|e| format!("malformed changes file '{}': {}", path.display(), e))?;

    specs
        .iter()
        .map(|spec| {
            let from = parse_color(&spec.from)
                .map_err(|e| format!("bad color '{}': {}", spec.from, e))?;
            let to = parse_color(&spec.to)
                .map_err(|e| format!("bad color '{}': {}", spec.to, e))?;
            Ok(PaletteChange { from, to })
        })
        .collect()
}

/// Output path for a recolored image.
fn recolor_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned());
    match (output_dir, stem) {
        (Some(dir), Some(stem)) => dir.join(format!("{}.png", stem)),
        (None, Some(stem)) => input.with_file_name(format!("{}_recolored.png", stem)),
        _ => input.with_extension("recolored.png"),
    }
}

fn run_recolor(
    inputs: &[PathBuf],
    changes_path: &Path,
    tolerance: Option<u32>,
    output_dir: Option<&Path>,
) -> ExitCode {
    let changes = match load_changes(changes_path) {
        Ok(changes) => changes,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let mode = match tolerance {
        Some(max_distance_sq) => MatchMode::Tolerance { max_distance_sq },
        None => MatchMode::Exact,
    };

    // Inputs are independent, recolor them in parallel
    let failures: Vec<String> = inputs
        .par_iter()
        .filter_map(|input| {
            let image = match image::open(input) {
                Ok(image) => image.to_rgba8(),
                Err(e) => return Some(format!("cannot open '{}': {}", input.display(), e)),
            };
            let result = apply_changes(&image, &changes, mode);
            let out_path = recolor_output_path(input, output_dir);
            match save_png(&result, &out_path) {
                Ok(()) => {
                    println!("Recolored '{}' -> '{}'", input.display(), out_path.display());
                    None
                }
                Err(e) => Some(format!("cannot write '{}': {}", out_path.display(), e)),
            }
        })
        .collect();

    if failures.is_empty() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        for message in failures {
            eprintln!("Error: {}", message);
        }
        ExitCode::from(EXIT_ERROR)
    }
}

/// Scan directories for PNGs and decode them into a catalog.
fn load_catalog(dirs: &[PathBuf]) -> Result<RasterCatalog, String> {
    let mut paths = Vec::new();
    for dir in dirs {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| format!("cannot read assets directory '{}': {}", dir.display(), e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_png = path
                .extension()
                .map_or(false, |ext| ext.to_string_lossy().eq_ignore_ascii_case("png"));
            if is_png {
                paths.push(path);
            }
        }
    }

    // Decoding is the slow part, fan it out
    let decoded: Vec<Result<(String, image::RgbaImage), String>> = paths
        .par_iter()
        .map(|path| {
            let image = image::open(path)
                .map_err(|e| format!("cannot decode '{}': {}", path.display(), e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((name, image.to_rgba8()))
        })
        .collect();

    let mut catalog = RasterCatalog::new();
    for result in decoded {
        let (name, image) = result?;
        catalog.insert(&name, image);
    }
    Ok(catalog)
}

fn run_render(
    map: &Path,
    assets: &[PathBuf],
    output: Option<&Path>,
    strict: bool,
) -> ExitCode {
    let doc = match read_document(map) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let catalog = match load_catalog(assets) {
        Ok(catalog) => catalog,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let (image, warnings) = render_map(&doc, &catalog);
    for warning in &warnings {
        eprintln!("Warning: {}", warning.message);
    }
    if strict && !warnings.is_empty() {
        eprintln!("Error: {} warnings in strict mode", warnings.len());
        return ExitCode::from(EXIT_ERROR);
    }

    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| map.with_extension("png"));
    if let Err(e) = save_png(&image, &out_path) {
        eprintln!("Error: cannot write '{}': {}", out_path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    println!(
        "Rendered '{}' ({}x{} pixels)",
        out_path.display(),
        image.width(),
        image.height()
    );
    ExitCode::from(EXIT_SUCCESS)
}
