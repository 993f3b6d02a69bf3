//! Scene Calibration Geometry
//!
//! Converts a static camera's scene description into the spatial primitives
//! the traffic metrics need:
//! - Normalized polygon/line coordinates to pixel coordinates
//! - Polygon rasterization into binary region masks
//! - Point-in-region containment tests
//! - Pixel-to-meter scale from a known-length reference line
//! - Point-to-stop-line distances

pub mod mask;
pub mod region;
pub mod scale;
pub mod scene;
pub mod stopline;

pub use mask::RegionMask;
pub use region::{NormalizedRegion, PixelPoint};
pub use scale::ScaleCalibration;
pub use scene::SceneConfig;
pub use stopline::StopLine;

use thiserror::Error;

/// Geometry error types
#[derive(Error, Debug)]
pub enum GeometryError {
    /// Reference-line endpoints coincide; no pixel distance to divide by
    #[error("Reference line is degenerate: endpoints coincide at ({x:.1}, {y:.1})")]
    DegenerateReferenceLine { x: f64, y: f64 },

    /// Reference length must be a positive number of meters
    #[error("Reference length {0} m is not positive")]
    NonPositiveReferenceLength(f64),

    /// Reference line must have exactly two points
    #[error("Reference line has {0} points, expected 2")]
    MalformedReferenceLine(usize),

    /// Every signal-controlled approach pairs an entrance area with a stop line
    #[error("Scene has {entrances} entrance areas but {stop_lines} stop lines")]
    ApproachMismatch { entrances: usize, stop_lines: usize },

    /// Raster dimensions must be non-zero
    #[error("Invalid raster dimensions {width}x{height}")]
    InvalidRaster { width: u32, height: u32 },
}
