use serde::{Deserialize, Serialize};

/// A detection expressed in the coordinate space of the full raster.
///
/// Invariants: `w > 0`, `h > 0`, `0 <= score <= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub label: String,
    pub score: f64,
}

impl GlobalBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64, label: impl Into<String>, score: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            label: label.into(),
            score,
        }
    }

    /// Right edge in global coordinates
    pub fn x2(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge in global coordinates
    pub fn y2(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Intersection-over-union with another box.
    ///
    /// Returns 0.0 for disjoint boxes and for degenerate unions.
    pub fn iou(&self, other: &GlobalBox) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}
