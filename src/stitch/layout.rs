//! Tile layout inference.
//!
//! Prediction tiles arrive as a flat directory of heterogeneously-named
//! image files. The grid position of each tile may be embedded in its
//! filename in several competing conventions, and the true canvas size
//! may or may not be known from a sidecar. This module decides, best
//! effort, how the tiles map onto a grid:
//!
//! ```text
//!   filenames ──> coordinate matchers ──> parsed (a, b) pairs
//!                                              │
//!   known canvas size ───────> interpretation scoring (row-major vs
//!                              column-major reading of the pairs)
//!                                              │
//!                                              ▼
//!                                         GridLayout
//! ```
//!
//! The heuristic is explicitly best effort: with ambiguous names and no
//! canvas size it refuses rather than guessing.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::StitchError;

// ============================================================================
// Filename coordinate matchers
// ============================================================================

static LABELED_ROW_COL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[_.\-]r?ow?[_.\-]?(\d+)[_.\-]c?o?l?[_.\-]?(\d+)").unwrap()
});
static SHORT_ROW_COL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[_.\-]r?(\d+)[_.\-]c?(\d+)").unwrap());
static SEPARATED_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[_.\-](\d+)[_.\-](\d+)").unwrap());
static DASH_DIMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)-(\d+)x(\d+)").unwrap());
static UNDERSCORE_DIMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_(\d+)x(\d+)").unwrap());
static ANY_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

fn captured_pair(pattern: &Regex, name: &str) -> Option<(u32, u32)> {
    let caps = pattern.captures(name)?;
    let first = caps.get(1)?.as_str().parse().ok()?;
    let second = caps.get(2)?.as_str().parse().ok()?;
    Some((first, second))
}

fn match_labeled_row_col(name: &str) -> Option<(u32, u32)> {
    captured_pair(&LABELED_ROW_COL, name)
}

fn match_short_row_col(name: &str) -> Option<(u32, u32)> {
    captured_pair(&SHORT_ROW_COL, name)
}

fn match_separated_pair(name: &str) -> Option<(u32, u32)> {
    captured_pair(&SEPARATED_PAIR, name)
}

fn match_dash_dims(name: &str) -> Option<(u32, u32)> {
    captured_pair(&DASH_DIMS, name)
}

fn match_underscore_dims(name: &str) -> Option<(u32, u32)> {
    captured_pair(&UNDERSCORE_DIMS, name)
}

/// Last resort: the last two integers found anywhere in the name.
fn match_last_two_ints(name: &str) -> Option<(u32, u32)> {
    let ints: Vec<&str> = ANY_INT.find_iter(name).map(|m| m.as_str()).collect();
    if ints.len() < 2 {
        return None;
    }
    let first = ints[ints.len() - 2].parse().ok()?;
    let second = ints[ints.len() - 1].parse().ok()?;
    Some((first, second))
}

type CoordMatcher = fn(&str) -> Option<(u32, u32)>;

/// Matchers in priority order: explicit row/col markers beat generic
/// integer pairs, which beat `NxM` dimension suffixes, which beat the
/// bare last-two-integers fallback.
const COORD_MATCHERS: &[(&str, CoordMatcher)] = &[
    ("labeled-row-col", match_labeled_row_col),
    ("short-row-col", match_short_row_col),
    ("separated-pair", match_separated_pair),
    ("dash-dims", match_dash_dims),
    ("underscore-dims", match_underscore_dims),
    ("last-two-ints", match_last_two_ints),
];

/// Extract the embedded `(first, second)` integer pair from a tile
/// filename, or `None` when fewer than two integers appear anywhere.
///
/// Which of the two integers is the row is not decided here; that is
/// the job of [`resolve_layout`].
pub fn extract_coord_pair(name: &str) -> Option<(u32, u32)> {
    for (label, matcher) in COORD_MATCHERS {
        if let Some(pair) = matcher(name) {
            debug!(file = name, matcher = label, "Parsed tile coordinates");
            return Some(pair);
        }
    }
    None
}

// ============================================================================
// Layout resolution
// ============================================================================

/// How parsed filename integers map onto grid positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilePlacement {
    /// First parsed integer is the row, second the column
    RowCol,
    /// First parsed integer is the column, second the row
    ColRow,
    /// No coordinates parsed: place tiles row-major in sorted filename
    /// order
    SortedRowMajor,
}

/// One per-tile prediction artifact found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFile {
    pub path: PathBuf,
    pub parsed_coords: Option<(u32, u32)>,
    pub pixel_size: (u32, u32),
}

/// The resolved description of how tiles cover the canvas.
///
/// Immutable once computed. `canvas_w`/`canvas_h` may be smaller than
/// the grid extent; the difference is removed by the final crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub n_cols: u32,
    pub n_rows: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub canvas_w: u32,
    pub canvas_h: u32,
    pub placement: TilePlacement,
}

/// Most frequent pixel size across the scanned tiles.
///
/// Majority vote rather than an assumed constant, because rim tiles are
/// commonly smaller. Ties keep the size seen first.
pub fn canonical_tile_size(files: &[TileFile]) -> Option<(u32, u32)> {
    let mut counts: Vec<((u32, u32), usize)> = Vec::new();
    for file in files {
        match counts.iter_mut().find(|(size, _)| *size == file.pixel_size) {
            Some(entry) => entry.1 += 1,
            None => counts.push((file.pixel_size, 1)),
        }
    }

    let mut best: Option<((u32, u32), usize)> = None;
    for &(size, count) in &counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((size, count));
        }
    }
    best.map(|(size, _)| size)
}

/// Inclusive extent of each integer position across the parsed pairs
fn coordinate_ranges(parsed: &[(u32, u32)]) -> Option<(u32, u32)> {
    let (&(f0, s0), rest) = parsed.split_first()?;
    let mut min_f = f0;
    let mut max_f = f0;
    let mut min_s = s0;
    let mut max_s = s0;
    for &(first, second) in rest {
        min_f = min_f.min(first);
        max_f = max_f.max(first);
        min_s = min_s.min(second);
        max_s = max_s.max(second);
    }
    Some((max_f - min_f + 1, max_s - min_s + 1))
}

fn prediction_error(cols: u32, rows: u32, tile_w: u32, tile_h: u32, full: (u32, u32)) -> u64 {
    let pred_w = cols as u64 * tile_w as u64;
    let pred_h = rows as u64 * tile_h as u64;
    pred_w.abs_diff(full.0 as u64) + pred_h.abs_diff(full.1 as u64)
}

/// Score "first integer is row" against "first integer is column" by
/// the canvas size each would predict. Ties keep the row-first reading.
fn choose_interpretation(
    range_first: u32,
    range_second: u32,
    tile_w: u32,
    tile_h: u32,
    full: (u32, u32),
) -> TilePlacement {
    let row_first = prediction_error(range_second, range_first, tile_w, tile_h, full);
    let col_first = prediction_error(range_first, range_second, tile_w, tile_h, full);
    if row_first <= col_first {
        TilePlacement::RowCol
    } else {
        TilePlacement::ColRow
    }
}

/// Resolve the grid layout for a scanned set of tiles.
///
/// `known_canvas` is the externally-known full raster size, when a
/// sidecar provided one. `tiles_per_row` is only consulted when no
/// filename parsed and no canvas size is known; in that case its
/// absence is fatal ([`StitchError::AmbiguousLayout`]), never silently
/// defaulted.
pub fn resolve_layout(
    files: &[TileFile],
    known_canvas: Option<(u32, u32)>,
    tiles_per_row: Option<u32>,
) -> Result<GridLayout, StitchError> {
    let (tile_w, tile_h) = canonical_tile_size(files).ok_or(StitchError::AmbiguousLayout)?;
    let parsed: Vec<(u32, u32)> = files.iter().filter_map(|f| f.parsed_coords).collect();
    let ranges = coordinate_ranges(&parsed);

    let placement = match (ranges, known_canvas) {
        (Some((rf, rs)), Some(full)) => choose_interpretation(rf, rs, tile_w, tile_h, full),
        (Some(_), None) => TilePlacement::RowCol,
        (None, _) => TilePlacement::SortedRowMajor,
    };

    let (n_cols, n_rows) = match (known_canvas, ranges) {
        (Some((full_w, full_h)), _) => (
            full_w.div_ceil(tile_w).max(1),
            full_h.div_ceil(tile_h).max(1),
        ),
        (None, Some((range_first, range_second))) => match placement {
            TilePlacement::ColRow => (range_first, range_second),
            _ => (range_second, range_first),
        },
        (None, None) => {
            let per_row = match tiles_per_row {
                Some(n) if n > 0 => n,
                _ => return Err(StitchError::AmbiguousLayout),
            };
            (per_row, (files.len() as u32).div_ceil(per_row))
        }
    };

    let (canvas_w, canvas_h) = known_canvas.unwrap_or((n_cols * tile_w, n_rows * tile_h));
    debug!(
        n_cols,
        n_rows,
        tile_w,
        tile_h,
        canvas_w,
        canvas_h,
        placement = ?placement,
        "Resolved tile layout"
    );

    Ok(GridLayout {
        n_cols,
        n_rows,
        tile_w,
        tile_h,
        canvas_w,
        canvas_h,
        placement,
    })
}
