//! Configuration management for the analysis service.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `TILEWELD_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use tileweld::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//!
//! println!("Listening on {}:{}", config.host, config.port);
//! println!("Detector backend: {}", config.detector_url);
//! ```
//!
//! # Environment Variables
//!
//! All configuration options can be set via environment variables with the `TILEWELD_` prefix:
//!
//! - `TILEWELD_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILEWELD_PORT` - Server port (default: 3000)
//! - `TILEWELD_UPLOADS_DIR` - Uploaded raster tree (default: data/uploads)
//! - `TILEWELD_TILES_DIR` - Tile pyramid tree (default: data/tiles)
//! - `TILEWELD_OUTPUTS_DIR` - Analysis output tree (default: data/outputs)
//! - `TILEWELD_DETECTOR_URL` - Detection backend endpoint
//! - `TILEWELD_SEGMENTER_URL` - Segmentation backend endpoint
//! - `TILEWELD_CALLBACK_URL` - Default webhook URL for job results
//! - `TILEWELD_CONCURRENCY` - Tiles processed in parallel (default: 4)
//! - `TILEWELD_SCORE_THRESHOLD` - Minimum detection score (default: 0.5)
//! - `TILEWELD_IOU_THRESHOLD` - Cross-tile merge IoU threshold (default: 0.5)
//! - `TILEWELD_NOTIFY_TIMEOUT` - Webhook delivery timeout seconds (default: 20)
//! - `TILEWELD_INFER_TIMEOUT` - Inference request timeout seconds (default: 60)

use std::path::PathBuf;

use clap::Parser;

use crate::detect::DEFAULT_IOU_THRESHOLD;
use crate::job::DEFAULT_NOTIFY_TIMEOUT_SECS;
use crate::pipeline::{DEFAULT_SCORE_THRESHOLD, DEFAULT_TILE_CONCURRENCY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default inference request timeout in seconds.
pub const DEFAULT_INFER_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tileweld - tile analysis and stitching service.
///
/// Dispatches per-tile inference over deep-zoom pyramids, reconciles the
/// results back into raster coordinates, and reports them to a webhook.
#[derive(Parser, Debug, Clone)]
#[command(name = "tileweld")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILEWELD_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILEWELD_PORT")]
    pub port: u16,

    // =========================================================================
    // Data Layout
    // =========================================================================
    /// Directory holding uploaded source rasters, grouped by analysis kind.
    #[arg(long, default_value = "data/uploads", env = "TILEWELD_UPLOADS_DIR")]
    pub uploads_dir: PathBuf,

    /// Directory holding tile pyramids, grouped by analysis kind.
    #[arg(long, default_value = "data/tiles", env = "TILEWELD_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Directory receiving analysis outputs (masks, mask pyramids).
    #[arg(long, default_value = "data/outputs", env = "TILEWELD_OUTPUTS_DIR")]
    pub outputs_dir: PathBuf,

    // =========================================================================
    // Inference Backends
    // =========================================================================
    /// Detection backend endpoint (receives PNG tiles, returns boxes).
    #[arg(
        long,
        default_value = "http://127.0.0.1:8500/detect",
        env = "TILEWELD_DETECTOR_URL"
    )]
    pub detector_url: String,

    /// Segmentation backend endpoint (receives PNG tiles, returns masks).
    #[arg(
        long,
        default_value = "http://127.0.0.1:8600/segment",
        env = "TILEWELD_SEGMENTER_URL"
    )]
    pub segmenter_url: String,

    /// Inference request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_INFER_TIMEOUT_SECS, env = "TILEWELD_INFER_TIMEOUT")]
    pub infer_timeout_secs: u64,

    // =========================================================================
    // Job Configuration
    // =========================================================================
    /// Default webhook URL notified when a job completes.
    ///
    /// A per-request `callback_url` overrides this. Without either, job
    /// results are only logged.
    #[arg(long, env = "TILEWELD_CALLBACK_URL")]
    pub callback_url: Option<String>,

    /// Number of tiles processed in parallel per job.
    #[arg(long, default_value_t = DEFAULT_TILE_CONCURRENCY, env = "TILEWELD_CONCURRENCY")]
    pub concurrency: usize,

    /// Minimum score for a detection to be kept.
    #[arg(long, default_value_t = DEFAULT_SCORE_THRESHOLD, env = "TILEWELD_SCORE_THRESHOLD")]
    pub score_threshold: f64,

    /// IoU threshold for cross-tile duplicate suppression.
    #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, env = "TILEWELD_IOU_THRESHOLD")]
    pub iou_threshold: f64,

    /// Webhook delivery timeout in seconds (15-30).
    #[arg(long, default_value_t = DEFAULT_NOTIFY_TIMEOUT_SECS, env = "TILEWELD_NOTIFY_TIMEOUT")]
    pub notify_timeout_secs: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILEWELD_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.detector_url.is_empty() {
            return Err(
                "Detector endpoint is required. Set --detector-url or TILEWELD_DETECTOR_URL"
                    .to_string(),
            );
        }
        if self.segmenter_url.is_empty() {
            return Err(
                "Segmenter endpoint is required. Set --segmenter-url or TILEWELD_SEGMENTER_URL"
                    .to_string(),
            );
        }

        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err("score_threshold must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err("iou_threshold must be between 0.0 and 1.0".to_string());
        }

        // Webhook deliveries must give slow receivers a chance but never
        // pin a worker for long after the job is done.
        if !(15..=30).contains(&self.notify_timeout_secs) {
            return Err("notify_timeout_secs must be between 15 and 30".to_string());
        }

        if self.infer_timeout_secs == 0 {
            return Err("infer_timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
