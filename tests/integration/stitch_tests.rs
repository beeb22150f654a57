//! Stitching integration tests over real tile folders.
//!
//! Tests verify:
//! - Coordinate parsing and row/column interpretation of filenames
//! - Sidecar-driven canvas sizing and cropping
//! - The caller-supplied grid-width fallback
//! - Round-tripping a cut pyramid back into its source raster

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};

use tileweld::stitch::write_canvas_size_xml;
use tileweld::{
    build_pyramid, deepest_zoom_level, stitch_folder, TileGeometry, TileImageFormat,
    TilePlacement,
};

use super::test_utils::write_tile;

/// Distinct solid colour for one grid cell.
fn cell(row: u32, col: u32) -> [u8; 3] {
    [(row * 70 + 40) as u8, (col * 70 + 40) as u8, 60]
}

fn pixel_at(canvas: &Path, x: u32, y: u32) -> [u8; 3] {
    image::open(canvas).unwrap().to_rgb8().get_pixel(x, y).0
}

// =============================================================================
// Filename Interpretation
// =============================================================================

#[test]
fn test_row_first_names_fill_row_major_grid() {
    let dir = tempfile::tempdir().unwrap();
    for row in 0..2 {
        for col in 0..3 {
            write_tile(
                &dir.path().join(format!("tile_{row}_{col}.png")),
                100,
                100,
                cell(row, col),
            );
        }
    }
    let out = dir.path().join("out/canvas.png");

    let summary = stitch_folder(dir.path(), &out, None, None).unwrap();
    assert_eq!(summary.tiles_placed, 6);
    assert_eq!(summary.layout.placement, TilePlacement::RowCol);
    assert_eq!((summary.layout.canvas_w, summary.layout.canvas_h), (300, 200));

    for row in 0..2 {
        for col in 0..3 {
            let px = pixel_at(&out, col * 100 + 50, row * 100 + 50);
            assert_eq!(px, cell(row, col), "cell ({row}, {col})");
        }
    }
}

#[test]
fn test_first_integer_reads_as_row_without_canvas() {
    // Six tiles whose first integer spans 0..=2 and second 0..=1. With
    // no external canvas size the first integer is taken as the row,
    // giving a 2-wide, 3-tall canvas.
    let dir = tempfile::tempdir().unwrap();
    for first in 0..3 {
        for second in 0..2 {
            write_tile(
                &dir.path().join(format!("tile_{first}_{second}.png")),
                100,
                100,
                cell(first, second),
            );
        }
    }
    let out = dir.path().join("canvas.png");

    let summary = stitch_folder(dir.path(), &out, None, None).unwrap();
    assert_eq!(summary.layout.placement, TilePlacement::RowCol);
    assert_eq!((summary.layout.canvas_w, summary.layout.canvas_h), (200, 300));
    assert_eq!(pixel_at(&out, 150, 250), cell(2, 1));
}

#[test]
fn test_known_canvas_flips_to_column_first() {
    // Same names as above, but a sidecar says the raster is 300x200.
    // Only the column-first reading predicts that size, so the first
    // integer is reinterpreted as the column.
    let dir = tempfile::tempdir().unwrap();
    for first in 0..3 {
        for second in 0..2 {
            write_tile(
                &dir.path().join(format!("tile_{first}_{second}.png")),
                100,
                100,
                cell(second, first),
            );
        }
    }
    let sidecar = dir.path().join("vips-properties.xml");
    std::fs::write(&sidecar, write_canvas_size_xml(300, 200)).unwrap();
    let out = dir.path().join("canvas.png");

    let summary = stitch_folder(dir.path(), &out, Some(&sidecar), None).unwrap();
    assert_eq!(summary.layout.placement, TilePlacement::ColRow);
    assert_eq!((summary.layout.canvas_w, summary.layout.canvas_h), (300, 200));

    // tile_2_1 carries cell(1, 2): column 2, row 1.
    assert_eq!(pixel_at(&out, 250, 150), cell(1, 2));
}

#[test]
fn test_suffixed_names_parse_by_trailing_integers() {
    // Prediction-style names still stitch; the integers are buried
    // before a textual suffix.
    let dir = tempfile::tempdir().unwrap();
    for first in 0..2 {
        for second in 0..2 {
            write_tile(
                &dir.path().join(format!("{first}_{second}_mask.png")),
                60,
                60,
                cell(first, second),
            );
        }
    }
    let out = dir.path().join("canvas.png");

    let summary = stitch_folder(dir.path(), &out, None, None).unwrap();
    assert_eq!((summary.layout.canvas_w, summary.layout.canvas_h), (120, 120));
    assert_eq!(pixel_at(&out, 30, 90), cell(1, 0));
    assert_eq!(pixel_at(&out, 90, 30), cell(0, 1));
}

// =============================================================================
// Sidecar Cropping
// =============================================================================

#[test]
fn test_sidecar_crops_to_true_canvas_size() {
    // A full 3x2 grid of 100px tiles covers 300x200, but the raster was
    // 290x195; the canvas is cropped to the sidecar size exactly.
    let dir = tempfile::tempdir().unwrap();
    for row in 0..2 {
        for col in 0..3 {
            write_tile(
                &dir.path().join(format!("t_{row}_{col}.png")),
                100,
                100,
                cell(row, col),
            );
        }
    }
    let sidecar = dir.path().join("vips-properties.xml");
    std::fs::write(&sidecar, write_canvas_size_xml(290, 195)).unwrap();
    let out = dir.path().join("canvas.png");

    let summary = stitch_folder(dir.path(), &out, Some(&sidecar), None).unwrap();
    assert_eq!((summary.layout.canvas_w, summary.layout.canvas_h), (290, 195));

    let canvas = image::open(&out).unwrap().to_rgb8();
    assert_eq!(canvas.dimensions(), (290, 195));
    assert_eq!(canvas.get_pixel(289, 194).0, cell(1, 2));
}

// =============================================================================
// Grid-Width Fallback
// =============================================================================

#[test]
fn test_tiles_per_row_places_sorted_files_row_major() {
    let dir = tempfile::tempdir().unwrap();
    write_tile(&dir.path().join("east.png"), 50, 50, cell(0, 0));
    write_tile(&dir.path().join("north.png"), 50, 50, cell(0, 1));
    write_tile(&dir.path().join("south.png"), 50, 50, cell(1, 0));
    write_tile(&dir.path().join("west.png"), 50, 50, cell(1, 1));
    let out = dir.path().join("canvas.png");

    let summary = stitch_folder(dir.path(), &out, None, Some(2)).unwrap();
    assert_eq!(summary.layout.placement, TilePlacement::SortedRowMajor);
    assert_eq!((summary.layout.canvas_w, summary.layout.canvas_h), (100, 100));

    // Sorted filename order: east, north, south, west.
    assert_eq!(pixel_at(&out, 25, 25), cell(0, 0));
    assert_eq!(pixel_at(&out, 75, 25), cell(0, 1));
    assert_eq!(pixel_at(&out, 25, 75), cell(1, 0));
    assert_eq!(pixel_at(&out, 75, 75), cell(1, 1));
}

// =============================================================================
// Pyramid Round Trip
// =============================================================================

#[test]
fn test_pyramid_deepest_level_restitches_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = RgbImage::from_fn(290, 195, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
    });

    let paths = build_pyramid(
        DynamicImage::ImageRgb8(source.clone()),
        &dir.path().join("scene"),
        TileGeometry::new(100, 0),
        TileImageFormat::Png,
    )
    .unwrap();

    let zoom = deepest_zoom_level(&paths.files_dir).unwrap();
    let sidecar = paths.files_dir.join("vips-properties.xml");
    let out = dir.path().join("restitched.png");
    stitch_folder(
        &paths.files_dir.join(zoom.to_string()),
        &out,
        Some(&sidecar),
        None,
    )
    .unwrap();

    let restitched = image::open(&out).unwrap().to_rgb8();
    assert_eq!(restitched.dimensions(), (290, 195));
    assert!(restitched == source, "restitched canvas differs from source");
}

#[test]
fn test_restitching_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let tiles = dir.path().join("tiles");
    write_tile(&tiles.join("t_0_0.png"), 40, 40, cell(0, 0));
    write_tile(&tiles.join("t_0_1.png"), 40, 40, cell(0, 1));

    let first = dir.path().join("a/out.png");
    let second = dir.path().join("b/out.png");
    stitch_folder(&tiles, &first, None, None).unwrap();
    stitch_folder(&tiles, &second, None, None).unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}
