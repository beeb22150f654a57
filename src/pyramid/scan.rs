//! Tile-tree discovery.
//!
//! A cut pyramid lives at `{kind}/{image_id}_files/{zoom}/{col}_{row}.{ext}`
//! with integer-named zoom directories, deepest (highest resolution)
//! being the numerically largest. Analysis always runs on the deepest
//! level.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PyramidError;
use crate::stitch::is_tile_image;

/// One tile of a zoom level with its grid position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomTile {
    pub path: PathBuf,
    pub col: u32,
    pub row: u32,
}

/// Parse `{col}_{row}` from a pyramid tile filename.
///
/// Pyramid tiles follow a strict convention: exactly two integers
/// separated by a single underscore, column first. Anything else is
/// rejected; this parser never guesses the way the stitch-side layout
/// inference does.
pub fn parse_tile_coords(filename: &str) -> Option<(u32, u32)> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() != 2 {
        return None;
    }
    let col = parts[0].parse().ok()?;
    let row = parts[1].parse().ok()?;
    Some((col, row))
}

/// Find the numerically largest integer-named zoom subdirectory.
pub fn deepest_zoom_level(files_dir: &Path) -> Result<u32, PyramidError> {
    if !files_dir.is_dir() {
        return Err(PyramidError::FolderMissing {
            path: files_dir.display().to_string(),
        });
    }

    let mut deepest: Option<u32> = None;
    for entry in std::fs::read_dir(files_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(level) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
            deepest = Some(deepest.map_or(level, |d: u32| d.max(level)));
        }
    }

    deepest.ok_or_else(|| PyramidError::NoZoomLevels {
        path: files_dir.display().to_string(),
    })
}

/// List the tiles of one zoom directory in sorted filename order.
///
/// Files with non-image extensions or names outside the `{col}_{row}`
/// convention are skipped.
pub fn list_zoom_tiles(zoom_dir: &Path) -> Result<Vec<ZoomTile>, PyramidError> {
    if !zoom_dir.is_dir() {
        return Err(PyramidError::FolderMissing {
            path: zoom_dir.display().to_string(),
        });
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(zoom_dir)? {
        let path = entry?.path();
        if path.is_file() && is_tile_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut tiles = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match parse_tile_coords(&name) {
            Some((col, row)) => tiles.push(ZoomTile { path, col, row }),
            None => debug!(file = name, "Skipping non-tile file in zoom folder"),
        }
    }
    Ok(tiles)
}
