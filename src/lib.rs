//! # Tileweld
//!
//! A tile analysis and stitching service for georeferenced raster pyramids.
//!
//! This library runs per-tile inference (object detection or semantic
//! segmentation) over deep-zoom tile pyramids, then reconciles the per-tile
//! results back into the coordinate frame of the source raster. Detection
//! boxes are translated out of each tile's overlap border and deduplicated
//! across tile seams; segmentation masks are stitched into a single canvas
//! and re-cut into a pyramid of their own.
//!
//! ## Features
//!
//! - **Overlap-aware reconciliation**: Per-tile boxes are trimmed to each
//!   tile's content region and translated into raster coordinates
//! - **Cross-seam deduplication**: Greedy IoU suppression merges boxes an
//!   object produced in neighboring tiles
//! - **Mosaic reassembly**: Mask tiles are stitched back into one canvas,
//!   with grid layout inferred from filenames or a sidecar
//! - **Pyramid cutting**: Deep-zoom pyramids are generated for uploads and
//!   stitched masks
//! - **Webhook delivery**: Jobs run detached and report exactly once to a
//!   callback URL
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`geometry`] - Tile offsets, content frames, coordinate translation
//! - [`detect`] - Detection boxes and cross-tile merging
//! - [`stitch`] - Grid layout inference and mosaic reassembly
//! - [`pyramid`] - Tile tree scanning and deep-zoom pyramid generation
//! - [`infer`] - Inference backend clients
//! - [`pipeline`] - Detection and segmentation job pipelines
//! - [`job`] - Job identity, dispatch, and webhook notification
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tileweld::{
//!     create_router, AnalysisService, AppState, Notifier, RemoteDetector, RemoteSegmenter,
//!     RouterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let timeout = Duration::from_secs(60);
//!     let detector =
//!         Arc::new(RemoteDetector::new("http://127.0.0.1:8500/detect", timeout).unwrap());
//!     let segmenter =
//!         Arc::new(RemoteSegmenter::new("http://127.0.0.1:8600/segment", timeout).unwrap());
//!     let analysis = Arc::new(AnalysisService::new(
//!         "data/tiles",
//!         "data/outputs",
//!         detector,
//!         segmenter,
//!     ));
//!
//!     let state = AppState {
//!         analysis,
//!         notifier: Arc::new(Notifier::new(Duration::from_secs(20)).unwrap()),
//!         uploads_dir: "data/uploads".into(),
//!         default_callback_url: None,
//!     };
//!     let _router = create_router(state, RouterConfig::new());
//!
//!     // Start the server...
//! }
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod infer;
pub mod job;
pub mod pipeline;
pub mod pyramid;
pub mod server;
pub mod stitch;

// Re-export commonly used types
pub use config::Config;
pub use detect::{merge_detections, GlobalBox, DEFAULT_IOU_THRESHOLD};
pub use error::{InferenceError, NotifyError, PipelineError, PyramidError, StitchError};
pub use geometry::{ContentFrame, TileGeometry};
pub use infer::{LocalDetection, RemoteDetector, RemoteSegmenter, TileDetector, TileSegmenter};
pub use job::{
    spawn_job, AnalysisKind, JobId, JobNotification, JobStatus, Notifier,
    DEFAULT_NOTIFY_TIMEOUT_SECS,
};
pub use pipeline::{
    AnalysisResult, AnalysisService, DEFAULT_SCORE_THRESHOLD, DEFAULT_TILE_CONCURRENCY,
};
pub use pyramid::{
    build_pyramid, deepest_zoom_level, generate_dzi_xml, level_dimensions, level_tile_count,
    list_zoom_tiles, max_pyramid_level, PyramidPaths, TileImageFormat, ZoomTile,
};
pub use server::{
    create_router, AppState, ErrorResponse, HealthResponse, JobAck, PyramidBuildResponse,
    RouterConfig,
};
pub use stitch::{
    resolve_layout, stitch_folder, GridLayout, StitchSummary, TileFile, TilePlacement,
};
