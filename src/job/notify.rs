//! Completion webhooks.
//!
//! One POST per job, success or failure, with a bounded timeout. There
//! is exactly one delivery attempt: a failed send is logged and
//! swallowed, never retried, and the job outcome stands regardless.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect::GlobalBox;
use crate::error::{NotifyError, PipelineError};
use crate::pipeline::AnalysisResult;

use super::{AnalysisKind, JobId, JobStatus};

/// Default webhook timeout in seconds
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 20;

/// Payload POSTed to the callback URL when a job finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobNotification {
    pub job_id: JobId,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub image_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<GlobalBox>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pyramid_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JobNotification {
    fn base(job_id: JobId, kind: AnalysisKind, image_id: &str, status: JobStatus) -> Self {
        Self {
            job_id,
            kind,
            image_id: image_id.to_string(),
            status,
            count: None,
            detections: None,
            mask_path: None,
            pyramid_path: None,
            error: None,
            detail: None,
        }
    }

    pub fn success(
        job_id: JobId,
        kind: AnalysisKind,
        image_id: &str,
        result: &AnalysisResult,
    ) -> Self {
        let mut note = Self::base(job_id, kind, image_id, JobStatus::Completed);
        match result {
            AnalysisResult::Detections(boxes) => {
                note.count = Some(boxes.len());
                note.detections = Some(boxes.clone());
            }
            AnalysisResult::Mask { mask_path, pyramid } => {
                note.mask_path = Some(mask_path.display().to_string());
                note.pyramid_path = Some(pyramid.descriptor.display().to_string());
            }
        }
        note
    }

    pub fn failure(job_id: JobId, kind: AnalysisKind, image_id: &str, error: &PipelineError) -> Self {
        let mut note = Self::base(job_id, kind, image_id, JobStatus::Failed);
        note.error = Some(error.to_string());
        note.detail = Some(format!("{error:?}"));
        note
    }
}

/// Delivers job outcomes to a callback URL
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifyError::Delivery(err.to_string()))?;
        Ok(Self { client })
    }

    /// POST the payload once. Non-2xx responses count as delivery
    /// failures the same as transport errors.
    pub async fn send(
        &self,
        callback_url: &str,
        payload: &JobNotification,
    ) -> Result<(), NotifyError> {
        self.client
            .post(callback_url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
