//! Canvas allocation and tile pasting.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImage};
use tracing::warn;

use crate::error::StitchError;

use super::layout::GridLayout;

/// One tile with its resolved zero-based grid position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedTile {
    pub row: u32,
    pub col: u32,
    pub path: PathBuf,
}

/// Composite placed tiles into a single canvas.
///
/// The buffer is allocated at the grid's full extent in the pixel mode
/// of `mode_source` (the first tile found on disk); every tile is
/// pasted at `(col * tile_w, row * tile_h)` with implicit mode
/// conversion, then the result is cropped to the layout's canvas size.
/// Tiles reaching past the grid extent are clipped; grid cells with no
/// tile keep the zero-initialized background. Both are deliberate:
/// gaps are not an error here.
pub fn compose_canvas(
    layout: &GridLayout,
    tiles: &[PlacedTile],
    mode_source: &Path,
) -> Result<DynamicImage, StitchError> {
    let grid_w = layout.n_cols * layout.tile_w;
    let grid_h = layout.n_rows * layout.tile_h;
    let color = image::open(mode_source)?.color();
    let mut canvas = DynamicImage::new(grid_w, grid_h, color);

    let mut pasted: u64 = 0;
    for tile in tiles {
        let x = tile.col * layout.tile_w;
        let y = tile.row * layout.tile_h;
        if x >= grid_w || y >= grid_h {
            warn!(
                path = %tile.path.display(),
                row = tile.row,
                col = tile.col,
                "Tile position lies outside the grid extent; skipped"
            );
            continue;
        }

        let img = image::open(&tile.path)?;
        let fit_w = img.width().min(grid_w - x);
        let fit_h = img.height().min(grid_h - y);
        let patch = if fit_w < img.width() || fit_h < img.height() {
            img.crop_imm(0, 0, fit_w, fit_h)
        } else {
            img
        };
        canvas.copy_from(&patch, x, y)?;
        pasted += 1;
    }

    let cells = layout.n_cols as u64 * layout.n_rows as u64;
    if pasted < cells {
        warn!(
            pasted,
            cells,
            missing = cells - pasted,
            "Canvas has unfilled tile regions left at background"
        );
    }

    if layout.canvas_w != grid_w || layout.canvas_h != grid_h {
        canvas = canvas.crop_imm(0, 0, layout.canvas_w, layout.canvas_h);
    }
    Ok(canvas)
}
