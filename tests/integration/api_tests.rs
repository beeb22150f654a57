//! API integration tests for the HTTP surface.
//!
//! Tests verify:
//! - Health and uploads listing
//! - Analysis dispatch (acknowledgement, validation, missing tile trees)
//! - Pyramid builds (generation, rerun short-circuit, missing uploads)
//! - Static tile serving

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{Rgb, RgbImage};
use tower::ServiceExt;

use tileweld::{create_router, AnalysisKind, AppState, RouterConfig};

use super::test_utils::{create_app_state, write_tile, write_tile_tree, ColorKeyedDetector, EchoSegmenter};

fn plain_state(root: &std::path::Path) -> AppState {
    create_app_state(
        root,
        Arc::new(ColorKeyedDetector::new()),
        Arc::new(EchoSegmenter),
    )
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_healthy_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(plain_state(dir.path()), RouterConfig::new());

    let (status, json) = get(router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(!json["version"].as_str().unwrap().is_empty());
}

// =============================================================================
// Analysis Dispatch
// =============================================================================

#[tokio::test]
async fn test_analysis_rejects_unknown_kind() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(plain_state(dir.path()), RouterConfig::new());

    let (status, json) = post(router, "/analyses/plane/scene-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_kind");
    assert!(json["message"].as_str().unwrap().contains("plane"));
}

#[tokio::test]
async fn test_analysis_rejects_traversal_image_id() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(plain_state(dir.path()), RouterConfig::new());

    let (status, json) = post(router, "/analyses/ship/a..b").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_image_id");
}

#[tokio::test]
async fn test_analysis_missing_tile_tree_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(plain_state(dir.path()), RouterConfig::new());

    let (status, json) = post(router, "/analyses/ship/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_analysis_dispatch_acknowledges_queued_job() {
    let dir = tempfile::tempdir().unwrap();
    let state = plain_state(dir.path());
    write_tile_tree(
        &dir.path().join("tiles"),
        AnalysisKind::Ship,
        "scene-1",
        13,
        &[(0, 0, 4, 4, [0, 0, 0])],
    );
    let router = create_router(state, RouterConfig::new());

    let (status, json) = post(router, "/analyses/ship/scene-1").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["status"], "queued");
    assert_eq!(json["type"], "ship");
    assert_eq!(json["image_id"], "scene-1");
    let job_id = json["job_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(job_id).is_ok());
}

// =============================================================================
// Uploads Listing
// =============================================================================

#[tokio::test]
async fn test_list_uploads_filters_and_sorts_tiffs() {
    let dir = tempfile::tempdir().unwrap();
    let state = plain_state(dir.path());

    let ship_uploads = dir.path().join("uploads").join("ship");
    std::fs::create_dir_all(&ship_uploads).unwrap();
    std::fs::write(ship_uploads.join("b.TIFF"), b"x").unwrap();
    std::fs::write(ship_uploads.join("a.tif"), b"x").unwrap();
    std::fs::write(ship_uploads.join("c.png"), b"x").unwrap();
    std::fs::create_dir_all(ship_uploads.join("nested.tif")).unwrap();

    let router = create_router(state, RouterConfig::new());
    let (status, json) = get(router, "/uploads/ship").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["type"], "ship");

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["image_id"], "a");
    assert_eq!(images[0]["filename"], "a.tif");
    assert_eq!(images[1]["image_id"], "b");
    assert_eq!(images[1]["filename"], "b.TIFF");
}

#[tokio::test]
async fn test_list_uploads_rejects_unknown_kind() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(plain_state(dir.path()), RouterConfig::new());

    let (status, json) = get(router, "/uploads/plane").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_kind");
}

// =============================================================================
// Pyramid Builds
// =============================================================================

#[tokio::test]
async fn test_build_pyramid_generates_then_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let state = plain_state(dir.path());

    let upload = dir.path().join("uploads").join("ship").join("scene-9.tif");
    std::fs::create_dir_all(upload.parent().unwrap()).unwrap();
    let raster = RgbImage::from_fn(30, 20, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    raster.save(&upload).unwrap();

    let router = create_router(state, RouterConfig::new());
    let (status, json) = post(router.clone(), "/pyramids/ship/scene-9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Tile pyramid generated");
    assert_eq!(json["type"], "ship");
    assert_eq!(json["image_id"], "scene-9");

    let tiles = dir.path().join("tiles").join("ship");
    assert!(tiles.join("scene-9.dzi").is_file());
    assert!(tiles.join("scene-9_files/vips-properties.xml").is_file());
    // max level for 30x20 is ceil(log2(30)) = 5; one 512px tile covers it.
    assert!(tiles.join("scene-9_files/5/0_0.jpeg").is_file());

    let (status, json) = post(router, "/pyramids/ship/scene-9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Tile pyramid already exists");
}

#[tokio::test]
async fn test_build_pyramid_missing_upload_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(plain_state(dir.path()), RouterConfig::new());

    let (status, json) = post(router, "/pyramids/ship/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

// =============================================================================
// Static Tile Serving
// =============================================================================

#[tokio::test]
async fn test_cut_tiles_are_served_statically() {
    let dir = tempfile::tempdir().unwrap();
    let state = plain_state(dir.path());
    let tile = dir
        .path()
        .join("tiles/ship/scene-2_files/10/0_0.jpeg");
    write_tile(&tile, 8, 8, [20, 30, 40]);
    let router = create_router(state, RouterConfig::new());

    let request = Request::builder()
        .uri("/tiles/ship/scene-2_files/10/0_0.jpeg")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
}
