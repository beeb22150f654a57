//! Detection pipeline: per-tile inference, overlap trimming, and
//! cross-tile merge.

use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use crate::detect::{merge_detections, GlobalBox};
use crate::error::PipelineError;
use crate::job::AnalysisKind;
use crate::pyramid::{deepest_zoom_level, list_zoom_tiles};

use super::AnalysisService;

/// Detections scoring below this are discarded before merging
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

pub(super) async fn run(
    service: &AnalysisService,
    image_id: &str,
) -> Result<Vec<GlobalBox>, PipelineError> {
    let geometry = AnalysisKind::Ship.geometry();
    let files_dir = service.tile_files_dir(AnalysisKind::Ship, image_id);
    let zoom = deepest_zoom_level(&files_dir)?;
    let tiles = list_zoom_tiles(&files_dir.join(zoom.to_string()))?;
    let tile_count = tiles.len();
    info!(image_id, zoom, tiles = tile_count, "Detection pass started");

    let semaphore = Arc::new(Semaphore::new(service.concurrency));
    let mut workers: JoinSet<Result<(usize, Vec<GlobalBox>), PipelineError>> = JoinSet::new();
    for (index, tile) in tiles.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let detector = Arc::clone(&service.detector);
        let score_threshold = service.score_threshold;
        workers.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|err| PipelineError::Worker(err.to_string()))?;

            let img = image::open(&tile.path)?;
            let (measured_w, measured_h) = img.dimensions();
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let local = detector.detect(&rgb).await?;

            let frame = geometry.frame(tile.col, tile.row, measured_w, measured_h);
            let mut boxes = Vec::new();
            for det in local {
                if det.score < score_threshold {
                    continue;
                }
                if let Some((x, y, w, h)) = frame.globalize(det.x1, det.y1, det.x2, det.y2) {
                    boxes.push(GlobalBox::new(x, y, w, h, det.label, det.score));
                }
            }
            Ok((index, boxes))
        });
    }

    // Barrier: every tile finishes before the merge runs. Results are
    // reassembled in tile order so reruns are byte-for-byte identical.
    let mut per_tile: Vec<Vec<GlobalBox>> = vec![Vec::new(); tile_count];
    while let Some(joined) = workers.join_next().await {
        let (index, boxes) = joined.map_err(|err| PipelineError::Worker(err.to_string()))??;
        per_tile[index] = boxes;
    }

    let collected: Vec<GlobalBox> = per_tile.into_iter().flatten().collect();
    let merged = merge_detections(collected, service.iou_threshold);
    info!(
        image_id,
        detections = merged.len(),
        "Detection pass complete"
    );
    Ok(merged)
}
