//! Segmentation pipeline: per-tile masks, geometric stitching, and the
//! mask's viewing pyramid.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use crate::error::PipelineError;
use crate::job::AnalysisKind;
use crate::pyramid::{build_pyramid, deepest_zoom_level, list_zoom_tiles};
use crate::pyramid::{PyramidPaths, TileImageFormat};
use crate::stitch::stitch_folder;

use super::AnalysisService;

pub(super) async fn run(
    service: &AnalysisService,
    image_id: &str,
) -> Result<(PathBuf, PyramidPaths), PipelineError> {
    let kind = AnalysisKind::OilSpill;
    let files_dir = service.tile_files_dir(kind, image_id);
    let zoom = deepest_zoom_level(&files_dir)?;
    let tiles = list_zoom_tiles(&files_dir.join(zoom.to_string()))?;
    info!(
        image_id,
        zoom,
        tiles = tiles.len(),
        "Segmentation pass started"
    );

    // Mask tiles for a rerun replace the previous set wholesale.
    let work_dir = service.outputs_dir.join(kind.as_str()).join(image_id);
    let pred_dir = work_dir.join("pred_tiles").join(zoom.to_string());
    if pred_dir.exists() {
        std::fs::remove_dir_all(&pred_dir)?;
    }
    std::fs::create_dir_all(&pred_dir)?;

    let semaphore = Arc::new(Semaphore::new(service.concurrency));
    let mut workers: JoinSet<Result<(), PipelineError>> = JoinSet::new();
    for tile in tiles {
        let semaphore = Arc::clone(&semaphore);
        let segmenter = Arc::clone(&service.segmenter);
        let pred_dir = pred_dir.clone();
        workers.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|err| PipelineError::Worker(err.to_string()))?;

            let img = image::open(&tile.path)?;
            let mask = segmenter.segment(&img).await?;
            mask.save(pred_dir.join(format!("{}_{}_mask.png", tile.col, tile.row)))?;
            Ok(())
        });
    }

    // Barrier: stitching only sees the complete mask-tile set.
    while let Some(joined) = workers.join_next().await {
        joined.map_err(|err| PipelineError::Worker(err.to_string()))??;
    }

    let sidecar = files_dir.join("vips-properties.xml");
    let sidecar = sidecar.is_file().then_some(sidecar);
    let mask_path = work_dir.join(format!("{image_id}_{kind}_mask.png"));
    let summary = stitch_folder(&pred_dir, &mask_path, sidecar.as_deref(), None)?;

    // Cut a fresh pyramid of the stitched mask so it can be viewed at
    // the same zoom levels as the source raster.
    let mask = image::open(&mask_path)?;
    let pyramid = build_pyramid(
        mask,
        &work_dir.join(format!("{image_id}_mask")),
        kind.geometry(),
        TileImageFormat::Png,
    )?;

    info!(
        image_id,
        mask = %mask_path.display(),
        width = summary.layout.canvas_w,
        height = summary.layout.canvas_h,
        "Segmentation pass complete"
    );
    Ok((mask_path, pyramid))
}
