//! Tile stitching: reassemble one raster from per-tile prediction files.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      stitch_folder                         │
//! │                                                            │
//! │  scan dir ──> TileFile records ──> resolve_layout          │
//! │   (sorted)     (coords + sizes)      │                     │
//! │                                      ▼                     │
//! │  sidecar xml ──> canvas size ──> place_tiles ──> compose   │
//! │  (optional)                                       │        │
//! │                                                   ▼        │
//! │                                          crop + save       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Layout resolution happens before anything is written, so a failed
//! stitch leaves no partial output file behind.

mod canvas;
mod layout;
mod sidecar;

pub use canvas::{compose_canvas, PlacedTile};
pub use layout::{
    canonical_tile_size, extract_coord_pair, resolve_layout, GridLayout, TileFile, TilePlacement,
};
pub use sidecar::{read_canvas_size, write_canvas_size_xml};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StitchError;

/// File extensions accepted as tile images
pub const TILE_EXTENSIONS: &[&str] = &["bmp", "jpeg", "jpg", "png", "tif", "tiff"];

/// Result of one completed stitch operation
#[derive(Debug, Clone)]
pub struct StitchSummary {
    pub layout: GridLayout,
    pub tiles_placed: usize,
}

pub(crate) fn is_tile_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_tile_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), StitchError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_tile_files(&path, found)?;
        } else if is_tile_image(&path) {
            found.push(path);
        }
    }
    Ok(())
}

/// Map scanned tiles onto zero-based grid cells.
///
/// For parsed placements, unparseable files are dropped and duplicate
/// coordinates resolve to the lexicographically last file. Observed
/// row/col minima are subtracted so a non-zero-based coordinate space
/// still produces a zero-origin canvas.
fn place_tiles(files: &[TileFile], layout: &GridLayout) -> Vec<PlacedTile> {
    if layout.placement == TilePlacement::SortedRowMajor {
        return files
            .iter()
            .enumerate()
            .map(|(i, file)| PlacedTile {
                row: i as u32 / layout.n_cols,
                col: i as u32 % layout.n_cols,
                path: file.path.clone(),
            })
            .collect();
    }

    let mut grid: BTreeMap<(u32, u32), PathBuf> = BTreeMap::new();
    let mut skipped = 0usize;
    for file in files {
        let Some((first, second)) = file.parsed_coords else {
            skipped += 1;
            continue;
        };
        let (row, col) = match layout.placement {
            TilePlacement::ColRow => (second, first),
            _ => (first, second),
        };
        grid.insert((row, col), file.path.clone());
    }
    if skipped > 0 {
        debug!(skipped, "Tiles without parseable coordinates were dropped");
    }

    let min_row = grid.keys().map(|&(row, _)| row).min().unwrap_or(0);
    let min_col = grid.keys().map(|&(_, col)| col).min().unwrap_or(0);
    grid.into_iter()
        .map(|((row, col), path)| PlacedTile {
            row: row - min_row,
            col: col - min_col,
            path,
        })
        .collect()
}

/// Stitch every tile image under `tile_dir` into one canvas at
/// `out_path`.
///
/// `sidecar` optionally points at a properties XML carrying the true
/// canvas size; `tiles_per_row` is the caller-supplied grid width used
/// only when no filename carries coordinates and no sidecar size is
/// available.
pub fn stitch_folder(
    tile_dir: &Path,
    out_path: &Path,
    sidecar_path: Option<&Path>,
    tiles_per_row: Option<u32>,
) -> Result<StitchSummary, StitchError> {
    if !tile_dir.is_dir() {
        return Err(StitchError::NoTiles {
            dir: tile_dir.display().to_string(),
        });
    }
    let mut paths = Vec::new();
    collect_tile_files(tile_dir, &mut paths)?;
    paths.sort();
    if paths.is_empty() {
        return Err(StitchError::NoTiles {
            dir: tile_dir.display().to_string(),
        });
    }

    let known_canvas = sidecar_path.and_then(read_canvas_size);

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pixel_size = image::image_dimensions(&path)?;
        files.push(TileFile {
            parsed_coords: extract_coord_pair(&name),
            path,
            pixel_size,
        });
    }

    let layout = resolve_layout(&files, known_canvas, tiles_per_row)?;
    let placed = place_tiles(&files, &layout);
    let canvas = compose_canvas(&layout, &placed, &files[0].path)?;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    canvas.save(out_path)?;
    info!(
        out = %out_path.display(),
        tiles = placed.len(),
        width = layout.canvas_w,
        height = layout.canvas_h,
        "Stitched canvas written"
    );

    Ok(StitchSummary {
        layout,
        tiles_placed: placed.len(),
    })
}
