//! Detached job execution.

use std::sync::Arc;

use tracing::{error, info};

use crate::pipeline::AnalysisService;

use super::{AnalysisKind, JobId, JobNotification, Notifier};

/// Dispatch one analysis as a detached background task and return its
/// identifier immediately.
///
/// The spawned task owns the error boundary: any pipeline failure is
/// converted into a failure notification rather than propagating. Once
/// dispatched, the job runs to completion or failure; there is no
/// cancellation handle.
pub fn spawn_job(
    service: Arc<AnalysisService>,
    notifier: Arc<Notifier>,
    kind: AnalysisKind,
    image_id: String,
    callback_url: Option<String>,
) -> JobId {
    let job_id = JobId::new();
    tokio::spawn(run_job(service, notifier, job_id, kind, image_id, callback_url));
    job_id
}

async fn run_job(
    service: Arc<AnalysisService>,
    notifier: Arc<Notifier>,
    job_id: JobId,
    kind: AnalysisKind,
    image_id: String,
    callback_url: Option<String>,
) {
    info!(%job_id, %kind, image_id = %image_id, "Job started");
    let outcome = service.run(kind, &image_id).await;
    let notification = match &outcome {
        Ok(result) => {
            info!(%job_id, "Job completed");
            JobNotification::success(job_id, kind, &image_id, result)
        }
        Err(err) => {
            error!(%job_id, error = %err, "Job failed");
            JobNotification::failure(job_id, kind, &image_id, err)
        }
    };

    let Some(url) = callback_url else {
        info!(%job_id, "No callback URL configured; outcome not delivered");
        return;
    };
    match notifier.send(&url, &notification).await {
        Ok(()) => info!(%job_id, callback = %url, "Completion webhook delivered"),
        // At most one delivery attempt. Keep the original job error in
        // the log so a lost webhook does not lose the failure cause.
        Err(delivery) => match &outcome {
            Ok(_) => error!(%job_id, error = %delivery, "Completion webhook failed"),
            Err(job_err) => {
                error!(
                    %job_id,
                    error = %delivery,
                    job_error = %job_err,
                    "Failure webhook undeliverable"
                );
            }
        },
    }
}
