//! Pixel-to-meter scale calibration

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Scale factor tying the pixel grid to real-world meters, derived once per
/// scene from a reference line of known physical length. Invariant for the
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleCalibration {
    meters_per_pixel: f64,
}

impl ScaleCalibration {
    /// Derive the scale from a two-point reference line (pixel coordinates)
    /// and its known physical length in meters.
    ///
    /// Coincident endpoints are rejected explicitly rather than dividing
    /// through to infinity.
    pub fn from_reference_line(
        a: (f64, f64),
        b: (f64, f64),
        length_m: f64,
    ) -> Result<Self, GeometryError> {
        if !(length_m > 0.0) {
            return Err(GeometryError::NonPositiveReferenceLength(length_m));
        }
        let pixel_distance = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        if pixel_distance < 1e-9 {
            return Err(GeometryError::DegenerateReferenceLine { x: a.0, y: a.1 });
        }
        Ok(Self {
            meters_per_pixel: length_m / pixel_distance,
        })
    }

    pub fn meters_per_pixel(&self) -> f64 {
        self.meters_per_pixel
    }

    /// Convert a pixel distance to meters
    pub fn pixels_to_meters(&self, pixels: f64) -> f64 {
        pixels * self.meters_per_pixel
    }
}
