use thiserror::Error;

/// Errors raised while scanning or generating tile pyramids
#[derive(Debug, Clone, Error)]
pub enum PyramidError {
    /// Tile folder for the requested raster does not exist
    #[error("Tile folder not found: {path}")]
    FolderMissing { path: String },

    /// Tile folder exists but contains no integer-named zoom subfolders
    #[error("No zoom-level subfolders found in: {path}")]
    NoZoomLevels { path: String },

    /// Uploaded source raster does not exist
    #[error("Source raster not found: {path}")]
    SourceMissing { path: String },

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<image::ImageError> for PyramidError {
    fn from(err: image::ImageError) -> Self {
        PyramidError::Image(err.to_string())
    }
}

impl From<std::io::Error> for PyramidError {
    fn from(err: std::io::Error) -> Self {
        PyramidError::Io(err.to_string())
    }
}

/// Errors raised while inferring a tile layout or compositing a canvas
#[derive(Debug, Clone, Error)]
pub enum StitchError {
    /// No tile images found under the prediction folder
    #[error("No tile images found in: {dir}")]
    NoTiles { dir: String },

    /// No filename carried parseable coordinates and no grid width was supplied.
    /// Fatal for the stitch operation; never silently defaulted.
    #[error("Ambiguous tile layout: no parseable coordinates in filenames and no tiles_per_row provided")]
    AmbiguousLayout,

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<image::ImageError> for StitchError {
    fn from(err: image::ImageError) -> Self {
        StitchError::Image(err.to_string())
    }
}

impl From<std::io::Error> for StitchError {
    fn from(err: std::io::Error) -> Self {
        StitchError::Io(err.to_string())
    }
}

/// Errors returned by a model collaborator.
///
/// Inference failures propagate up to the job boundary; they are never
/// retried at the tile level.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// The model backend returned an error or was unreachable
    #[error("Model backend error: {0}")]
    Backend(String),

    /// The backend responded, but the payload could not be decoded
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// The tile could not be encoded for transport
    #[error("Tile encode error: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        InferenceError::Backend(err.to_string())
    }
}

/// Completion-webhook delivery failure.
///
/// Logged and swallowed by the job runner; the job outcome stands
/// regardless of whether the callback was reachable.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Webhook delivery failed: {0}")]
    Delivery(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Delivery(err.to_string())
    }
}

/// Top-level orchestration errors.
///
/// Wraps the per-layer errors so pipeline entry points can use `?`
/// throughout, and maps onto HTTP statuses at the server boundary.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Unknown analysis kind in a request path
    #[error("Invalid analysis kind: '{kind}' (expected 'ship' or 'oilspill')")]
    InvalidKind { kind: String },

    /// Image identifier that would escape the data directories
    #[error("Invalid image id: '{image_id}'")]
    InvalidImageId { image_id: String },

    #[error(transparent)]
    Pyramid(#[from] PyramidError),

    #[error(transparent)]
    Stitch(#[from] StitchError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Image decode/encode error outside the pyramid/stitch layers
    #[error("Image error: {0}")]
    Image(String),

    /// Filesystem error outside the pyramid/stitch layers
    #[error("I/O error: {0}")]
    Io(String),

    /// A spawned worker task aborted or panicked
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        PipelineError::Image(err.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}
