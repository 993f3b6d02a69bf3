//! Normalized regions and pixel points

use serde::{Deserialize, Serialize};

/// Integer point on the pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in pixels
    pub fn distance_to(&self, other: PixelPoint) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Ordered point sequence in [0,1]x[0,1] scene-relative coordinates.
///
/// Describes a closed polygon (regions) or an open polyline (reference and
/// stop lines). Defined once per scene; point ordering is significant for
/// rasterization and is preserved. Slightly out-of-range values from scene
/// authoring are accepted and land outside the raster, where rasterization
/// clips them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedRegion(Vec<(f64, f64)>);

impl NormalizedRegion {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scale fractional coordinates to a WxH raster, rounding to the
    /// nearest integer pixel
    pub fn denormalize(&self, width: u32, height: u32) -> Vec<PixelPoint> {
        self.0
            .iter()
            .map(|&(x, y)| PixelPoint {
                x: (x * width as f64).round() as i32,
                y: (y * height as f64).round() as i32,
            })
            .collect()
    }

    /// Scale fractional coordinates to a WxH raster without rounding.
    /// Used where sub-pixel precision matters (scale line, stop lines).
    pub fn denormalize_f64(&self, width: u32, height: u32) -> Vec<(f64, f64)> {
        self.0
            .iter()
            .map(|&(x, y)| (x * width as f64, y * height as f64))
            .collect()
    }
}
