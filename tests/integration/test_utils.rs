//! Test utilities for integration tests.
//!
//! This module provides fake model collaborators, tile-tree builders,
//! and an in-process webhook receiver.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tileweld::stitch::write_canvas_size_xml;
use tileweld::{
    AnalysisKind, AnalysisService, AppState, InferenceError, LocalDetection, Notifier,
    TileDetector, TileSegmenter,
};

// =============================================================================
// Fake Model Collaborators
// =============================================================================

/// A detector that returns canned detections selected by the tile's
/// top-left pixel colour.
///
/// Tests paint each tile a distinct solid colour, so the colour works
/// as the tile's identity without any shared mutable state.
pub struct ColorKeyedDetector {
    responses: HashMap<[u8; 3], Vec<LocalDetection>>,
    calls: AtomicUsize,
}

impl ColorKeyedDetector {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Canned detections for tiles whose top-left pixel is `rgb`.
    pub fn with_response(mut self, rgb: [u8; 3], detections: Vec<LocalDetection>) -> Self {
        self.responses.insert(rgb, detections);
        self
    }

    /// Number of tiles this detector has been called with.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ColorKeyedDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TileDetector for ColorKeyedDetector {
    async fn detect(&self, tile: &DynamicImage) -> Result<Vec<LocalDetection>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = tile.to_rgb8().get_pixel(0, 0).0;
        Ok(self.responses.get(&key).cloned().unwrap_or_default())
    }
}

/// A detector whose every call fails with a backend error.
pub struct FailingDetector {
    message: String,
}

impl FailingDetector {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TileDetector for FailingDetector {
    async fn detect(&self, _tile: &DynamicImage) -> Result<Vec<LocalDetection>, InferenceError> {
        Err(InferenceError::Backend(self.message.clone()))
    }
}

/// A segmenter that returns the input tile unchanged as its mask.
///
/// Stitching the echoed masks must reproduce the source mosaic, which
/// makes placement errors visible as pixel differences.
pub struct EchoSegmenter;

#[async_trait]
impl TileSegmenter for EchoSegmenter {
    async fn segment(&self, tile: &DynamicImage) -> Result<DynamicImage, InferenceError> {
        Ok(tile.clone())
    }
}

// =============================================================================
// Detection Helpers
// =============================================================================

/// Tile-local detection with the given corners and score.
pub fn local_box(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> LocalDetection {
    LocalDetection {
        x1,
        y1,
        x2,
        y2,
        label: "ship".to_string(),
        score,
    }
}

// =============================================================================
// Tile Tree Builders
// =============================================================================

/// Write one solid-colour PNG tile, creating parent directories.
pub fn write_tile(path: &Path, w: u32, h: u32, rgb: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(w, h, Rgb(rgb)).save(path).unwrap();
}

/// Lay out a cut tile tree under
/// `{tiles_dir}/{kind}/{image_id}_files/{zoom}/{col}_{row}.png` and
/// return the `_files` directory.
///
/// Tiles are given as `(col, row, width, height, colour)`.
pub fn write_tile_tree(
    tiles_dir: &Path,
    kind: AnalysisKind,
    image_id: &str,
    zoom: u32,
    tiles: &[(u32, u32, u32, u32, [u8; 3])],
) -> PathBuf {
    let files_dir = tiles_dir
        .join(kind.as_str())
        .join(format!("{image_id}_files"));
    for &(col, row, w, h, rgb) in tiles {
        let path = files_dir
            .join(zoom.to_string())
            .join(format!("{col}_{row}.png"));
        write_tile(&path, w, h, rgb);
    }
    files_dir
}

/// Write a canvas-size sidecar into a `_files` directory.
pub fn write_sidecar(files_dir: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(files_dir).unwrap();
    std::fs::write(
        files_dir.join("vips-properties.xml"),
        write_canvas_size_xml(width, height),
    )
    .unwrap();
}

// =============================================================================
// Application State
// =============================================================================

/// Build an `AppState` with its data directories rooted at `root`.
pub fn create_app_state(
    root: &Path,
    detector: Arc<dyn TileDetector>,
    segmenter: Arc<dyn TileSegmenter>,
) -> AppState {
    for sub in ["uploads", "tiles", "outputs"] {
        std::fs::create_dir_all(root.join(sub)).unwrap();
    }
    let analysis = AnalysisService::new(root.join("tiles"), root.join("outputs"), detector, segmenter)
        .with_concurrency(2);
    AppState {
        analysis: Arc::new(analysis),
        notifier: Arc::new(Notifier::new(Duration::from_secs(15)).unwrap()),
        uploads_dir: root.join("uploads"),
        default_callback_url: None,
    }
}

// =============================================================================
// Webhook Receiver
// =============================================================================

async fn record_payload(
    State(sink): State<Arc<Mutex<Vec<serde_json::Value>>>>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    sink.lock().unwrap().push(payload);
    StatusCode::OK
}

/// An in-process HTTP endpoint capturing webhook deliveries.
pub struct WebhookReceiver {
    pub url: String,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl WebhookReceiver {
    /// Bind a capture endpoint on an ephemeral local port.
    pub async fn spawn() -> Self {
        let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        let app = axum::Router::new()
            .route("/hook", post(record_payload))
            .with_state(Arc::clone(&received));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            url: format!("http://{addr}/hook"),
            received,
        }
    }

    /// Wait until at least `count` payloads have arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<serde_json::Value> {
        for _ in 0..400 {
            {
                let got = self.received.lock().unwrap();
                if got.len() >= count {
                    return got.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        let got = self.received.lock().unwrap();
        panic!("expected {count} webhook payloads, saw {}", got.len());
    }

    /// Everything delivered so far.
    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().unwrap().clone()
    }
}
