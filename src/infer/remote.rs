//! HTTP-backed model collaborators.
//!
//! Tiles are shipped to the model servers as PNG bodies. The detector
//! answers with a JSON detection list, the segmenter with an encoded
//! mask image.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use serde::Deserialize;
use tracing::debug;

use crate::error::InferenceError;

use super::{LocalDetection, TileDetector, TileSegmenter};

fn build_client(timeout: Duration) -> Result<reqwest::Client, InferenceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| InferenceError::Backend(err.to_string()))
}

fn encode_png(tile: &DynamicImage) -> Result<Vec<u8>, InferenceError> {
    let mut buf = Vec::new();
    tile.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|err| InferenceError::Encode(err.to_string()))?;
    Ok(buf)
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    detections: Vec<LocalDetection>,
}

/// Object detector reached over HTTP
#[derive(Debug, Clone)]
pub struct RemoteDetector {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteDetector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TileDetector for RemoteDetector {
    async fn detect(&self, tile: &DynamicImage) -> Result<Vec<LocalDetection>, InferenceError> {
        let body = encode_png(tile)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: DetectResponse = response
            .json()
            .await
            .map_err(|err| InferenceError::InvalidResponse(err.to_string()))?;
        debug!(
            endpoint = %self.endpoint,
            detections = parsed.detections.len(),
            "Detector response received"
        );
        Ok(parsed.detections)
    }
}

/// Pixel-classification model reached over HTTP
#[derive(Debug, Clone)]
pub struct RemoteSegmenter {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteSegmenter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TileSegmenter for RemoteSegmenter {
    async fn segment(&self, tile: &DynamicImage) -> Result<DynamicImage, InferenceError> {
        let body = encode_png(tile)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        image::load_from_memory(&bytes)
            .map_err(|err| InferenceError::InvalidResponse(err.to_string()))
    }
}
