//! Tile-pyramid generation.
//!
//! Writes a DZI-style pyramid next to a descriptor XML:
//!
//! ```text
//! {prefix}.dzi                      <- descriptor
//! {prefix}_files/
//!     vips-properties.xml           <- canvas-size sidecar
//!     {level}/{col}_{row}.{ext}     <- tiles, level 0 = 1x1-ish
//! ```
//!
//! Levels halve in size from the deepest level down to level 0. Tiles
//! carry the configured overlap on interior edges, so cutting and the
//! analysis-side coordinate remapping agree on geometry.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::PyramidError;
use crate::geometry::TileGeometry;
use crate::stitch::write_canvas_size_xml;

/// Encoding for the tiles of one pyramid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileImageFormat {
    Jpeg,
    Png,
}

impl TileImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TileImageFormat::Jpeg => "jpeg",
            TileImageFormat::Png => "png",
        }
    }
}

/// Filesystem artifacts of one generated pyramid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidPaths {
    pub descriptor: PathBuf,
    pub files_dir: PathBuf,
}

/// Deepest pyramid level for an image: `ceil(log2(max(w, h)))`.
///
/// Level 0 is always 1x1 or degenerate-small; a 1x1 image has a
/// single-level pyramid.
pub fn max_pyramid_level(width: u32, height: u32) -> u32 {
    let max_dim = width.max(height) as f64;
    if max_dim <= 1.0 {
        return 0;
    }
    max_dim.log2().ceil() as u32
}

/// Dimensions of one pyramid level, halving per step up from `level`
/// to `max_level`. Out-of-range levels yield `(0, 0)`.
pub fn level_dimensions(width: u32, height: u32, level: u32, max_level: u32) -> (u32, u32) {
    if level > max_level {
        return (0, 0);
    }
    let scale = 1u32 << (max_level - level);
    (
        width.div_ceil(scale).max(1),
        height.div_ceil(scale).max(1),
    )
}

/// Number of tile columns and rows covering one level
pub fn level_tile_count(level_w: u32, level_h: u32, tile_size: u32) -> (u32, u32) {
    (
        level_w.div_ceil(tile_size).max(1),
        level_h.div_ceil(tile_size).max(1),
    )
}

/// DZI descriptor XML for a pyramid
pub fn generate_dzi_xml(
    width: u32,
    height: u32,
    tile_size: u32,
    overlap: u32,
    format: TileImageFormat,
) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
       TileSize="{}"
       Overlap="{}"
       Format="{}">
    <Size Width="{}" Height="{}"/>
</Image>"#,
        tile_size,
        overlap,
        format.extension(),
        width,
        height
    )
}

/// Pixel region of one tile within its level, overlap included.
///
/// Interior tiles extend `overlap` pixels into each neighbour; tiles on
/// the level rim are clamped to the level bounds.
fn tile_region(
    geometry: TileGeometry,
    col: u32,
    row: u32,
    level_w: u32,
    level_h: u32,
) -> (u32, u32, u32, u32) {
    let ts = geometry.tile_size;
    let ov = geometry.overlap;
    let x0 = if col > 0 { col * ts - ov } else { 0 };
    let y0 = if row > 0 { row * ts - ov } else { 0 };
    let x1 = ((col + 1) * ts + ov).min(level_w);
    let y1 = ((row + 1) * ts + ov).min(level_h);
    (x0, y0, x1 - x0, y1 - y0)
}

/// Cut a full tile pyramid for `source` rooted at `output_prefix`.
///
/// Takes the source by value: the deepest level is cut from it
/// directly, then it is consumed by the level-by-level downscaling.
/// Rebuilding an unchanged source produces byte-identical artifacts.
pub fn build_pyramid(
    source: DynamicImage,
    output_prefix: &Path,
    geometry: TileGeometry,
    format: TileImageFormat,
) -> Result<PyramidPaths, PyramidError> {
    let (width, height) = source.dimensions();
    let max_level = max_pyramid_level(width, height);

    let descriptor = PathBuf::from(format!("{}.dzi", output_prefix.display()));
    let files_dir = PathBuf::from(format!("{}_files", output_prefix.display()));

    if let Some(parent) = descriptor.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        &descriptor,
        generate_dzi_xml(width, height, geometry.tile_size, geometry.overlap, format),
    )?;
    std::fs::create_dir_all(&files_dir)?;
    std::fs::write(
        files_dir.join("vips-properties.xml"),
        write_canvas_size_xml(width, height),
    )?;

    let mut current = source;
    for level in (0..=max_level).rev() {
        let (level_w, level_h) = level_dimensions(width, height, level, max_level);
        let level_dir = files_dir.join(level.to_string());
        std::fs::create_dir_all(&level_dir)?;

        let (cols, rows) = level_tile_count(level_w, level_h, geometry.tile_size);
        for row in 0..rows {
            for col in 0..cols {
                let (x, y, w, h) = tile_region(geometry, col, row, level_w, level_h);
                let patch = current.crop_imm(x, y, w, h);
                let path = level_dir.join(format!("{}_{}.{}", col, row, format.extension()));
                match format {
                    // JPEG cannot carry an alpha channel.
                    TileImageFormat::Jpeg => DynamicImage::ImageRgb8(patch.to_rgb8()).save(&path)?,
                    TileImageFormat::Png => patch.save(&path)?,
                }
            }
        }
        debug!(level, level_w, level_h, cols, rows, "Pyramid level written");

        if level > 0 {
            let (next_w, next_h) = level_dimensions(width, height, level - 1, max_level);
            current = current.resize_exact(next_w, next_h, FilterType::Triangle);
        }
    }

    info!(
        prefix = %output_prefix.display(),
        width,
        height,
        levels = max_level + 1,
        "Tile pyramid generated"
    );
    Ok(PyramidPaths {
        descriptor,
        files_dir,
    })
}
