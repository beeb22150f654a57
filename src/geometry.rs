//! Tile geometry and local-to-global coordinate remapping.
//!
//! A tile pyramid is cut with a fixed nominal tile size and a fixed
//! per-edge overlap. Each tile is authoritative only for its interior
//! content region; the overlap border belongs to the neighbouring tile
//! that owns it. Content extents are computed from the *measured* tile
//! dimensions, never the nominal size, so undersized rim tiles fall out
//! correctly. The content origin is special-cased at index 0 (no
//! leading border exists there), while border trimming applies the
//! overlap width uniformly on every tile.

/// Per-kind cutting parameters for a tile pyramid.
///
/// Invariant: `tile_size > 2 * overlap`, otherwise a tile would have no
/// owned content at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    /// Nominal tile edge in pixels, excluding overlap borders
    pub tile_size: u32,
    /// Pixels duplicated from each neighbouring tile on shared edges
    pub overlap: u32,
}

impl TileGeometry {
    pub const fn new(tile_size: u32, overlap: u32) -> Self {
        Self { tile_size, overlap }
    }

    /// Global coordinate of a tile's content origin along one axis.
    ///
    /// Index 0 has no leading overlap border, so its content starts at
    /// the raster origin; every later index starts `overlap` pixels
    /// before its nominal grid position.
    pub fn content_offset(&self, index: u32) -> u32 {
        if index == 0 {
            0
        } else {
            index * self.tile_size - self.overlap
        }
    }

    /// Content frame for the tile at `(col, row)` given its measured
    /// pixel dimensions.
    pub fn frame(&self, col: u32, row: u32, measured_w: u32, measured_h: u32) -> ContentFrame {
        ContentFrame {
            origin_x: self.content_offset(col),
            origin_y: self.content_offset(row),
            content_w: measured_w.saturating_sub(2 * self.overlap),
            content_h: measured_h.saturating_sub(2 * self.overlap),
            overlap: self.overlap,
        }
    }
}

/// The owned region of one tile, positioned in global raster space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentFrame {
    pub origin_x: u32,
    pub origin_y: u32,
    pub content_w: u32,
    pub content_h: u32,
    overlap: u32,
}

impl ContentFrame {
    /// Remap a tile-local box `(x1, y1, x2, y2)` into global
    /// `(x, y, w, h)`.
    ///
    /// Returns `None` when any edge of the box reaches into the overlap
    /// border. The comparisons are strict: a box whose edge sits exactly
    /// on the content boundary is kept, one that crosses into the border
    /// by any amount is dropped and left for the neighbouring tile that
    /// owns that region.
    pub fn globalize(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Option<(f64, f64, f64, f64)> {
        let ov = self.overlap as f64;
        if x1 < ov || y1 < ov {
            return None;
        }
        if x2 > ov + self.content_w as f64 || y2 > ov + self.content_h as f64 {
            return None;
        }
        let x = self.origin_x as f64 + (x1 - ov);
        let y = self.origin_y as f64 + (y1 - ov);
        Some((x, y, x2 - x1, y2 - y1))
    }
}
