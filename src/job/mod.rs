//! Background analysis jobs.
//!
//! A job is fire-and-forget: the request path acknowledges immediately
//! with a [`JobId`], a detached task runs the pipeline to completion or
//! failure, and exactly one webhook notification reports the outcome.
//! There is no cancellation and no retry. Output paths are keyed by
//! image and kind rather than by job, so two concurrent jobs over the
//! same image and kind race on the same files.

mod notify;
mod runner;

pub use notify::{JobNotification, Notifier, DEFAULT_NOTIFY_TIMEOUT_SECS};
pub use runner::spawn_job;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::geometry::TileGeometry;

/// The two supported analysis families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Ship,
    OilSpill,
}

impl AnalysisKind {
    /// Parse the path segment used in requests and directory names
    pub fn parse(value: &str) -> Result<Self, PipelineError> {
        match value {
            "ship" => Ok(AnalysisKind::Ship),
            "oilspill" => Ok(AnalysisKind::OilSpill),
            other => Err(PipelineError::InvalidKind {
                kind: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Ship => "ship",
            AnalysisKind::OilSpill => "oilspill",
        }
    }

    /// Cutting geometry of this kind's tile pyramids
    pub fn geometry(&self) -> TileGeometry {
        match self {
            AnalysisKind::Ship => TileGeometry::new(512, 1),
            AnalysisKind::OilSpill => TileGeometry::new(256, 0),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque job identifier handed back in the acknowledgement and echoed
/// in the completion webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state reported for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}
