//! Detection types and cross-tile duplicate suppression.

mod bbox;
mod merge;

pub use bbox::GlobalBox;
pub use merge::{merge_detections, DEFAULT_IOU_THRESHOLD};
