//! Stop-line distance queries

use crate::region::{NormalizedRegion, PixelPoint};

/// A stop line in pixel coordinates, kept as an open polyline.
///
/// Queue-length reporting measures from a queued vehicle back to this line,
/// so the relevant quantity is the shortest distance from a point to any
/// segment of the polyline.
#[derive(Debug, Clone)]
pub struct StopLine {
    points: Vec<(f64, f64)>,
}

impl StopLine {
    pub fn from_region(region: &NormalizedRegion, width: u32, height: u32) -> Self {
        Self {
            points: region.denormalize_f64(width, height),
        }
    }

    /// Shortest distance in pixels from `point` to the polyline.
    /// Degenerate lines (fewer than 2 points) yield infinity so they can
    /// never produce a spurious shortest queue.
    pub fn distance_to(&self, point: PixelPoint) -> f64 {
        let p = (point.x as f64, point.y as f64);
        match self.points.len() {
            0 => f64::INFINITY,
            1 => segment_distance(p, self.points[0], self.points[0]),
            _ => self
                .points
                .windows(2)
                .map(|seg| segment_distance(p, seg[0], seg[1]))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

/// Distance from `p` to the segment `ab`, clamping the projection to the
/// segment's extent.
fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let ab = (b.0 - a.0, b.1 - a.1);
    let ap = (p.0 - a.0, p.1 - a.1);
    let ab_sq = ab.0 * ab.0 + ab.1 * ab.1;

    let foot = if ab_sq == 0.0 {
        a
    } else {
        let t = ((ap.0 * ab.0 + ap.1 * ab.1) / ab_sq).clamp(0.0, 1.0);
        (a.0 + t * ab.0, a.1 + t * ab.1)
    };
    ((p.0 - foot.0).powi(2) + (p.1 - foot.1).powi(2)).sqrt()
}
