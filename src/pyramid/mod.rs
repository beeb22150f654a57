//! Tile-pyramid discovery and generation.

mod builder;
mod scan;

pub use builder::{
    build_pyramid, generate_dzi_xml, level_dimensions, level_tile_count, max_pyramid_level,
    PyramidPaths, TileImageFormat,
};
pub use scan::{deepest_zoom_level, list_zoom_tiles, parse_tile_coords, ZoomTile};
