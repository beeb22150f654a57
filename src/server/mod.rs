//! HTTP server layer for the analysis service.
//!
//! This module provides the HTTP API for dispatching analysis jobs and
//! cutting tile pyramids.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   POST /analyses/{kind}/{image_id}                              │
//! │   POST /pyramids/{kind}/{image_id}                              │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (requests, job dispatch) │  │      (router config)        │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    build_pyramid_handler, health_handler, list_uploads_handler, start_analysis_handler,
    AnalysisPathParams, AnalysisRequest, AppState, ErrorResponse, HealthResponse, JobAck,
    PyramidBuildResponse, UploadEntry, UploadsResponse,
};
pub use routes::{create_router, RouterConfig};
