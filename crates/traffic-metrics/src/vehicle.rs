//! Per-vehicle tracked state

use scene_geometry::{PixelPoint, ScaleCalibration};
use serde::{Deserialize, Serialize};

/// Spatial-temporal state for one vehicle inside the monitored region,
/// keyed by track id in the aggregator.
///
/// Traveled distance is the polyline length over successive observed
/// positions, not the entry-to-exit chord; this matters for curved turns
/// through the intersection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    /// First position observed inside the region
    pub entry_point: PixelPoint,

    /// Frame of the entry observation
    pub entry_frame: u64,

    /// Classification label used for metric grouping
    pub track_class: u32,

    /// Most recent observed position
    pub latest_point: PixelPoint,

    /// Frame of the most recent observation
    pub latest_frame: u64,

    /// Accumulated traveled distance (pixels)
    pub traveled_px: f64,

    /// Number of in-region observations
    pub observations: u32,
}

impl VehicleState {
    /// State for a vehicle's first qualifying observation
    pub fn enter(point: PixelPoint, frame: u64, track_class: u32) -> Self {
        Self {
            entry_point: point,
            entry_frame: frame,
            track_class,
            latest_point: point,
            latest_frame: frame,
            traveled_px: 0.0,
            observations: 1,
        }
    }

    /// Fold in a subsequent qualifying observation, accumulating the
    /// incremental displacement from the previous position
    pub fn update(&mut self, point: PixelPoint, frame: u64) {
        self.traveled_px += self.latest_point.distance_to(point);
        self.latest_point = point;
        self.latest_frame = frame;
        self.observations += 1;
    }

    /// Whether the transit can produce a speed sample: at least two
    /// observations and positive elapsed frames
    pub fn has_transit(&self) -> bool {
        self.observations >= 2 && self.latest_frame > self.entry_frame
    }

    /// Speed over the transit in km/h, or `None` for incomplete transits
    /// (zero elapsed time never divides)
    pub fn speed_kmh(&self, calibration: ScaleCalibration, frame_rate: f64) -> Option<f64> {
        if !self.has_transit() {
            return None;
        }
        let meters = calibration.pixels_to_meters(self.traveled_px);
        let seconds = (self.latest_frame - self.entry_frame) as f64 / frame_rate;
        Some(meters / seconds * 3.6)
    }
}
