//! Cross-tile duplicate suppression.
//!
//! Overlap trimming cannot remove every duplicate: an object straddling
//! a tile boundary can survive, post-trim, in the interior of two
//! adjacent tiles. Greedy non-maximum suppression over the concatenated
//! global boxes is the sole exactly-once counting mechanism, so it runs
//! class-agnostic across all labels.

use tracing::debug;

use super::bbox::GlobalBox;

/// Default IoU above which two boxes are considered the same object
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;

/// Greedy non-maximum suppression ordered by descending score.
///
/// A box is suppressed when its IoU with an already-kept box reaches
/// the threshold; a pair at exactly the threshold is suppressed. Output
/// order is descending score.
pub fn merge_detections(detections: Vec<GlobalBox>, iou_threshold: f64) -> Vec<GlobalBox> {
    let input_len = detections.len();
    let mut remaining = detections;
    remaining.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let current = remaining.remove(0);
        remaining.retain(|candidate| candidate.iou(&current) < iou_threshold);
        kept.push(current);
    }

    if kept.len() < input_len {
        debug!(
            input = input_len,
            kept = kept.len(),
            "Suppressed duplicate detections"
        );
    }
    kept
}
