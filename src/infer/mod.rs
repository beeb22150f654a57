//! Inference collaborators.
//!
//! The detector and segmenter are black boxes that take one tile image
//! and return tile-local results. They are injected into orchestration
//! as process-scoped, read-only handles so tests can substitute fakes;
//! nothing in this crate reaches for them as ambient globals.

mod remote;

pub use remote::{RemoteDetector, RemoteSegmenter};

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// One detection in tile-local pixel coordinates, corners inclusive of
/// the overlap border
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDetection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub label: String,
    pub score: f64,
}

/// Object detector operating on a single tile.
///
/// Implementations must be safe for concurrent use; tile-level calls
/// run in parallel.
#[async_trait]
pub trait TileDetector: Send + Sync {
    async fn detect(&self, tile: &DynamicImage) -> Result<Vec<LocalDetection>, InferenceError>;
}

/// Pixel-classification model operating on a single tile.
///
/// Returns a mask image of the same dimensions as the input tile.
#[async_trait]
pub trait TileSegmenter: Send + Sync {
    async fn segment(&self, tile: &DynamicImage) -> Result<DynamicImage, InferenceError>;
}
