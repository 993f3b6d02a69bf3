//! Detection record types

use scene_geometry::PixelPoint;
use serde::{Deserialize, Serialize};

/// Axis-aligned detection box in pixel coordinates, x1 < x2 and y1 < y2
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Integer-rounded box centroid, the single point standing in for the
    /// vehicle in every spatial test. Total: degenerate single-pixel boxes
    /// still yield a point.
    pub fn centroid(&self) -> PixelPoint {
        PixelPoint {
            x: ((self.x1 + self.x2) / 2.0).round() as i32,
            y: ((self.y1 + self.y2) / 2.0).round() as i32,
        }
    }
}

/// One observation of one vehicle in one frame.
///
/// Created by the upstream tracker for every frame the vehicle is visible;
/// immutable once created. Frame indices are monotonically non-decreasing
/// per vehicle as emitted by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Frame index within the source video
    pub frame: u64,

    /// Track identifier, stable across the vehicle's lifetime
    pub track_id: u64,

    /// Detection bounding box
    pub bbox: BoundingBox,

    /// Detection confidence in [0, 1]
    pub confidence: f32,

    /// Detected object class
    pub class_id: u32,

    /// Track-level classification label used for metric grouping
    pub track_class: u32,
}

impl DetectionRecord {
    /// The vehicle's representative position in this frame
    pub fn position(&self) -> PixelPoint {
        self.bbox.centroid()
    }
}
