//! Per-raster analysis orchestration.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       AnalysisService                         │
//! │                                                               │
//! │   scan deepest zoom ──> bounded per-tile inference ──barrier──│
//! │                                                        │      │
//! │         ship:  globalize + trim ──> greedy merge <─────┤      │
//! │     oilspill:  mask tiles ──> stitch ──> mask pyramid <┘      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tile-level inference calls share no mutable state and run in
//! parallel up to a configured bound; the merge and stitch steps are
//! barrier points that only run once every tile of the zoom level has
//! been processed. Reruns over an unchanged tile folder produce
//! identical results.

mod detection;
mod segmentation;

pub use detection::DEFAULT_SCORE_THRESHOLD;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detect::{GlobalBox, DEFAULT_IOU_THRESHOLD};
use crate::error::PipelineError;
use crate::infer::{TileDetector, TileSegmenter};
use crate::job::AnalysisKind;
use crate::pyramid::PyramidPaths;

/// Default bound on concurrent tile-level inference calls
pub const DEFAULT_TILE_CONCURRENCY: usize = 4;

/// Outcome of one analysis run
#[derive(Debug, Clone)]
pub enum AnalysisResult {
    /// Merged global detections for the whole raster
    Detections(Vec<GlobalBox>),
    /// Stitched mask artifact plus its freshly cut viewing pyramid
    Mask {
        mask_path: PathBuf,
        pyramid: PyramidPaths,
    },
}

/// Drives tile scanning, inference, coordinate reconciliation, and
/// stitching for one raster at a time.
///
/// The model collaborators are injected once at construction and shared
/// read-only across all jobs and tile tasks.
pub struct AnalysisService {
    tiles_dir: PathBuf,
    outputs_dir: PathBuf,
    detector: Arc<dyn TileDetector>,
    segmenter: Arc<dyn TileSegmenter>,
    concurrency: usize,
    score_threshold: f64,
    iou_threshold: f64,
}

impl AnalysisService {
    pub fn new(
        tiles_dir: impl Into<PathBuf>,
        outputs_dir: impl Into<PathBuf>,
        detector: Arc<dyn TileDetector>,
        segmenter: Arc<dyn TileSegmenter>,
    ) -> Self {
        Self {
            tiles_dir: tiles_dir.into(),
            outputs_dir: outputs_dir.into(),
            detector,
            segmenter,
            concurrency: DEFAULT_TILE_CONCURRENCY,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }

    /// Bound on concurrent tile-level inference calls
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Minimum detector score kept before merging
    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// IoU at which overlapping detections collapse to one
    pub fn with_iou_threshold(mut self, threshold: f64) -> Self {
        self.iou_threshold = threshold;
        self
    }

    pub fn tiles_dir(&self) -> &Path {
        &self.tiles_dir
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    /// Root of the cut tile tree for one raster:
    /// `{tiles_dir}/{kind}/{image_id}_files`
    pub fn tile_files_dir(&self, kind: AnalysisKind, image_id: &str) -> PathBuf {
        self.tiles_dir
            .join(kind.as_str())
            .join(format!("{image_id}_files"))
    }

    /// Run the full analysis for one raster.
    ///
    /// Ship imagery goes through the detection pipeline, oil-spill
    /// imagery through segmentation and stitching.
    pub async fn run(
        &self,
        kind: AnalysisKind,
        image_id: &str,
    ) -> Result<AnalysisResult, PipelineError> {
        match kind {
            AnalysisKind::Ship => {
                let boxes = detection::run(self, image_id).await?;
                Ok(AnalysisResult::Detections(boxes))
            }
            AnalysisKind::OilSpill => {
                let (mask_path, pyramid) = segmentation::run(self, image_id).await?;
                Ok(AnalysisResult::Mask { mask_path, pyramid })
            }
        }
    }
}
