//! Scene configuration
//!
//! All lane geometry for one camera view, supplied once per scene as
//! normalized coordinates: entrance areas, exit areas, stop lines, the
//! intersection footprint, and the physical scale reference line.

use serde::{Deserialize, Serialize};

use crate::mask::RegionMask;
use crate::region::NormalizedRegion;
use crate::scale::ScaleCalibration;
use crate::stopline::StopLine;
use crate::GeometryError;

fn default_frame_rate() -> f64 {
    30.0
}

/// Scene configuration for a fixed camera view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Frame width (pixels)
    pub width: u32,

    /// Frame height (pixels)
    pub height: u32,

    /// Two-point reference line (normalized coordinates)
    pub reference_line: NormalizedRegion,

    /// Real-world length of the reference line (meters)
    pub reference_length_m: f64,

    /// One polygon per signal-controlled entrance approach
    pub entrance_areas: Vec<NormalizedRegion>,

    /// One polygon per exit lane
    pub exit_areas: Vec<NormalizedRegion>,

    /// One polyline per approach, paired with `entrance_areas` by index
    pub stop_lines: Vec<NormalizedRegion>,

    /// The intersection footprint (one or more polygons)
    pub intersection_area: Vec<NormalizedRegion>,

    /// Video frame rate (frames per second)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
}

impl SceneConfig {
    /// Check internal consistency before any masks are built.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.width == 0 || self.height == 0 {
            return Err(GeometryError::InvalidRaster {
                width: self.width,
                height: self.height,
            });
        }
        if self.reference_line.len() != 2 {
            return Err(GeometryError::MalformedReferenceLine(
                self.reference_line.len(),
            ));
        }
        if self.entrance_areas.len() != self.stop_lines.len() {
            return Err(GeometryError::ApproachMismatch {
                entrances: self.entrance_areas.len(),
                stop_lines: self.stop_lines.len(),
            });
        }
        Ok(())
    }

    /// Derive the pixel-to-meter scale from the reference line.
    /// Fatal on a degenerate line; no physical units without it.
    pub fn calibration(&self) -> Result<ScaleCalibration, GeometryError> {
        let line = self.reference_line.denormalize_f64(self.width, self.height);
        if line.len() != 2 {
            return Err(GeometryError::MalformedReferenceLine(line.len()));
        }
        ScaleCalibration::from_reference_line(line[0], line[1], self.reference_length_m)
    }

    /// Union mask of the intersection footprint
    pub fn intersection_mask(&self) -> Result<RegionMask, GeometryError> {
        RegionMask::build(&self.intersection_area, self.width, self.height)
    }

    /// One mask per exit lane, index-aligned with `exit_areas`
    pub fn exit_masks(&self) -> Result<Vec<RegionMask>, GeometryError> {
        self.exit_areas
            .iter()
            .map(|area| RegionMask::build(std::slice::from_ref(area), self.width, self.height))
            .collect()
    }

    /// One mask per entrance approach, index-aligned with `entrance_areas`
    pub fn entrance_masks(&self) -> Result<Vec<RegionMask>, GeometryError> {
        self.entrance_areas
            .iter()
            .map(|area| RegionMask::build(std::slice::from_ref(area), self.width, self.height))
            .collect()
    }

    /// Stop lines in pixel coordinates, index-aligned with approaches
    pub fn stop_lines_px(&self) -> Vec<StopLine> {
        self.stop_lines
            .iter()
            .map(|line| StopLine::from_region(line, self.width, self.height))
            .collect()
    }
}
