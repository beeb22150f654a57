//! HTTP request handlers.
//!
//! # Endpoints
//!
//! - `POST /analyses/{kind}/{image_id}` - Dispatch a background analysis job
//! - `POST /pyramids/{kind}/{image_id}` - Cut a tile pyramid for an upload
//! - `GET /health` - Health check endpoint

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, PyramidError};
use crate::job::{spawn_job, AnalysisKind, JobId, JobStatus, Notifier};
use crate::pipeline::AnalysisService;
use crate::pyramid::{build_pyramid, deepest_zoom_level, PyramidPaths, TileImageFormat};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State
/// extractor.
///
/// The analysis service and notifier are process-scoped singletons;
/// every dispatched job shares them.
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub notifier: Arc<Notifier>,

    /// Root of the uploaded-raster tree consumed by pyramid builds
    pub uploads_dir: PathBuf,

    /// Callback URL used when an analysis request does not carry one
    pub default_callback_url: Option<String>,
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters shared by the analysis and pyramid endpoints.
///
/// Extracted from: `/{kind}/{image_id}`
#[derive(Debug, Deserialize)]
pub struct AnalysisPathParams {
    /// Analysis family ("ship" or "oilspill")
    pub kind: String,

    /// Raster identifier, a single path segment
    pub image_id: String,
}

/// Optional JSON body of an analysis request
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    /// Overrides the server-wide callback URL for this job
    #[serde(default)]
    pub callback_url: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Immediate acknowledgement for a dispatched job
#[derive(Debug, Serialize, Deserialize)]
pub struct JobAck {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub image_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PyramidBuildResponse {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub image_id: String,
    pub descriptor: String,
    pub files_dir: String,
}

/// One uploaded raster, as reported by the uploads listing
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadEntry {
    pub image_id: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadsResponse {
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub images: Vec<UploadEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Standard JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error type
    pub error: String,

    /// Human-readable message
    pub message: String,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            PipelineError::InvalidKind { .. } => (StatusCode::BAD_REQUEST, "invalid_kind"),
            PipelineError::InvalidImageId { .. } => (StatusCode::BAD_REQUEST, "invalid_image_id"),
            PipelineError::Pyramid(
                PyramidError::FolderMissing { .. }
                | PyramidError::NoZoomLevels { .. }
                | PyramidError::SourceMissing { .. },
            ) => (StatusCode::NOT_FOUND, "not_found"),
            PipelineError::Pyramid(_) => (StatusCode::INTERNAL_SERVER_ERROR, "pyramid_error"),
            PipelineError::Stitch(_) => (StatusCode::INTERNAL_SERVER_ERROR, "stitch_error"),
            PipelineError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_error"),
            PipelineError::Image(_) => (StatusCode::INTERNAL_SERVER_ERROR, "image_error"),
            PipelineError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            PipelineError::Worker(_) => (StatusCode::INTERNAL_SERVER_ERROR, "worker_error"),
        };

        let message = self.to_string();
        if status.is_server_error() {
            error!(error_type, message = %message, "Request failed");
        } else if status == StatusCode::NOT_FOUND {
            debug!(error_type, message = %message, "Resource not found");
        } else {
            warn!(error_type, message = %message, "Request rejected");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
///
/// # Endpoint
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Identifiers are single path segments; anything that could traverse
/// out of the data directories is rejected up front.
fn validate_image_id(image_id: &str) -> Result<(), PipelineError> {
    let suspect = image_id.is_empty()
        || image_id.contains('/')
        || image_id.contains('\\')
        || image_id.contains("..");
    if suspect {
        return Err(PipelineError::InvalidImageId {
            image_id: image_id.to_string(),
        });
    }
    Ok(())
}

/// Dispatch a detection or segmentation job for an already-tiled
/// raster.
///
/// # Endpoint
/// `POST /analyses/{kind}/{image_id}`
///
/// That the tile tree exists is checked synchronously, so a missing
/// raster is a 404 on the request rather than a failed webhook later;
/// everything else happens in the detached job.
///
/// # Response
/// `202 Accepted` with the job acknowledgement.
pub async fn start_analysis_handler(
    State(state): State<AppState>,
    Path(params): Path<AnalysisPathParams>,
    body: Option<Json<AnalysisRequest>>,
) -> Result<(StatusCode, Json<JobAck>), PipelineError> {
    let kind = AnalysisKind::parse(&params.kind)?;
    validate_image_id(&params.image_id)?;

    let files_dir = state.analysis.tile_files_dir(kind, &params.image_id);
    deepest_zoom_level(&files_dir)?;

    let callback_url = body
        .and_then(|Json(request)| request.callback_url)
        .or_else(|| state.default_callback_url.clone());
    let job_id = spawn_job(
        Arc::clone(&state.analysis),
        Arc::clone(&state.notifier),
        kind,
        params.image_id.clone(),
        callback_url,
    );
    info!(%job_id, %kind, image_id = %params.image_id, "Analysis job dispatched");

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAck {
            job_id,
            status: JobStatus::Queued,
            kind,
            image_id: params.image_id,
        }),
    ))
}

fn find_upload(uploads_dir: &FsPath, kind: AnalysisKind, image_id: &str) -> Option<PathBuf> {
    ["tif", "tiff"]
        .iter()
        .map(|ext| {
            uploads_dir
                .join(kind.as_str())
                .join(format!("{image_id}.{ext}"))
        })
        .find(|path| path.is_file())
}

fn is_tiff_name(name: &str) -> bool {
    FsPath::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

/// List uploaded rasters for one analysis kind.
///
/// # Endpoint
/// `GET /uploads/{kind}`
pub async fn list_uploads_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<UploadsResponse>, PipelineError> {
    let kind = AnalysisKind::parse(&kind)?;

    let dir = state.uploads_dir.join(kind.as_str());
    let mut images = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !entry.path().is_file() || !is_tiff_name(&filename) {
            continue;
        }
        let image_id = FsPath::new(&filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&filename)
            .to_string();
        images.push(UploadEntry { image_id, filename });
    }
    images.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(Json(UploadsResponse { kind, images }))
}

/// Cut a tile pyramid for an uploaded raster.
///
/// # Endpoint
/// `POST /pyramids/{kind}/{image_id}`
///
/// Expects `{uploads_dir}/{kind}/{image_id}.tif[f]` to exist and writes
/// the pyramid under `{tiles_dir}/{kind}/`. The cut runs on the
/// blocking pool and the response waits for it to finish.
pub async fn build_pyramid_handler(
    State(state): State<AppState>,
    Path(params): Path<AnalysisPathParams>,
) -> Result<Json<PyramidBuildResponse>, PipelineError> {
    let kind = AnalysisKind::parse(&params.kind)?;
    validate_image_id(&params.image_id)?;

    let prefix = state
        .analysis
        .tiles_dir()
        .join(kind.as_str())
        .join(&params.image_id);

    // An existing descriptor means the raster was already cut; recutting
    // an unchanged upload produces the identical tree
    let descriptor = PathBuf::from(format!("{}.dzi", prefix.display()));
    if descriptor.is_file() {
        return Ok(Json(PyramidBuildResponse {
            message: "Tile pyramid already exists".to_string(),
            kind,
            image_id: params.image_id,
            descriptor: descriptor.display().to_string(),
            files_dir: format!("{}_files", prefix.display()),
        }));
    }

    let source = find_upload(&state.uploads_dir, kind, &params.image_id).ok_or_else(|| {
        PyramidError::SourceMissing {
            path: state
                .uploads_dir
                .join(kind.as_str())
                .join(format!("{}.tiff", params.image_id))
                .display()
                .to_string(),
        }
    })?;
    let geometry = kind.geometry();

    let paths: PyramidPaths =
        tokio::task::spawn_blocking(move || -> Result<PyramidPaths, PyramidError> {
            let raster = image::open(&source)?;
            build_pyramid(raster, &prefix, geometry, TileImageFormat::Jpeg)
        })
        .await
        .map_err(|err| PipelineError::Worker(err.to_string()))??;

    info!(%kind, image_id = %params.image_id, "Tile pyramid built");
    Ok(Json(PyramidBuildResponse {
        message: "Tile pyramid generated".to_string(),
        kind,
        image_id: params.image_id,
        descriptor: paths.descriptor.display().to_string(),
        files_dir: paths.files_dir.display().to_string(),
    }))
}
