//! Queue length at green onset
//!
//! Signal phase timing is not observable from track data alone; the caller
//! supplies the frame index of green onset per approach. At that frame,
//! vehicles standing still inside the approach's entrance area form the
//! queue, and its length is the stop-line distance of the rearmost one.

use std::collections::BTreeMap;

use scene_geometry::{PixelPoint, RegionMask, ScaleCalibration, StopLine};
use serde::{Deserialize, Serialize};
use track_model::DetectionRecord;
use tracing::{debug, warn};

/// Queue-detection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum displacement (pixels) over the window for a vehicle to
    /// count as stationary
    pub stationary_px: f64,

    /// Frames preceding green onset over which movement is tested
    pub stationary_window: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            stationary_px: 3.0,
            stationary_window: 15,
        }
    }
}

/// Green-onset frame per approach index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalTiming(BTreeMap<usize, u64>);

impl SignalTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_green_onset(&mut self, approach: usize, frame: u64) {
        self.0.insert(approach, frame);
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.0.iter().map(|(&a, &f)| (a, f))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(usize, u64)> for SignalTiming {
    fn from_iter<T: IntoIterator<Item = (usize, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Queue measurement for one approach at its green onset
#[derive(Debug, Clone, Serialize)]
pub struct ApproachQueue {
    /// Approach index, aligned with the scene's `entrance_areas`
    pub approach: usize,

    /// Frame at which the signal turned green
    pub green_frame: u64,

    /// Distance from the rearmost queued vehicle to the stop line
    /// (meters); absent when nothing is queued
    pub queue_m: Option<f64>,

    /// Track ids of the queued vehicles
    pub queued_vehicles: Vec<u64>,
}

/// Shortest queue tail across several approaches sharing an entrance;
/// `None` when every approach is empty
pub fn shortest_queue_m(queues: &[ApproachQueue]) -> Option<f64> {
    queues
        .iter()
        .filter_map(|q| q.queue_m)
        .fold(None, |acc, d| Some(acc.map_or(d, |a: f64| a.min(d))))
}

/// First and last observed position per vehicle within the onset window
struct WindowTrack {
    first_point: PixelPoint,
    first_frame: u64,
    last_point: PixelPoint,
    last_frame: u64,
}

pub(crate) fn queue_for_approach(
    records: &[DetectionRecord],
    entrance_mask: &RegionMask,
    stop_line: &StopLine,
    calibration: ScaleCalibration,
    config: &QueueConfig,
    approach: usize,
    green_frame: u64,
) -> ApproachQueue {
    let window_start = green_frame.saturating_sub(config.stationary_window);

    let mut window: BTreeMap<u64, WindowTrack> = BTreeMap::new();
    for record in records {
        if record.frame < window_start || record.frame > green_frame {
            continue;
        }
        let point = record.position();
        window
            .entry(record.track_id)
            .and_modify(|t| {
                if record.frame < t.first_frame {
                    t.first_point = point;
                    t.first_frame = record.frame;
                }
                if record.frame >= t.last_frame {
                    t.last_point = point;
                    t.last_frame = record.frame;
                }
            })
            .or_insert(WindowTrack {
                first_point: point,
                first_frame: record.frame,
                last_point: point,
                last_frame: record.frame,
            });
    }

    let mut queued_vehicles = Vec::new();
    let mut rearmost_px: Option<f64> = None;
    for (track_id, track) in &window {
        if !entrance_mask.contains(track.last_point) {
            continue;
        }
        if track.first_frame == track.last_frame {
            debug!(
                vehicle = *track_id,
                approach, "single observation in queue window, stationarity unknown"
            );
            continue;
        }
        if track.first_point.distance_to(track.last_point) >= config.stationary_px {
            continue;
        }

        queued_vehicles.push(*track_id);
        let distance = stop_line.distance_to(track.last_point);
        rearmost_px = Some(rearmost_px.map_or(distance, |d| d.max(distance)));
    }

    let queue_m = match rearmost_px {
        Some(px) if px.is_finite() => Some(calibration.pixels_to_meters(px)),
        Some(_) => {
            warn!(approach, "stop line is degenerate, queue length undefined");
            None
        }
        None => {
            debug!(approach, green_frame, "no queued vehicles at green onset");
            None
        }
    };

    ApproachQueue {
        approach,
        green_frame,
        queue_m,
        queued_vehicles,
    }
}
