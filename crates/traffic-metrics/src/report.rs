//! Aggregated metric report types

use std::collections::BTreeMap;

use serde::Serialize;

/// Speed aggregate for one vehicle class
#[derive(Debug, Clone, Serialize)]
pub struct ClassSpeed {
    /// Mean speed over all complete transits of this class (km/h)
    pub mean_kmh: f64,

    /// Number of vehicles contributing to the mean
    pub samples: usize,
}

/// Headway samples for one exit lane.
///
/// Empty sample vectors mean the metric is absent for that lane, never that
/// it is zero.
#[derive(Debug, Clone, Serialize)]
pub struct LaneHeadways {
    /// Exit lane index, aligned with the scene's `exit_areas`
    pub lane: usize,

    /// Time gaps between consecutive lane entries (seconds)
    pub headway_times_s: Vec<f64>,

    /// Distance gaps between consecutive vehicles' entry positions (meters)
    pub headway_distances_m: Vec<f64>,
}

/// Final output of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct TrafficReport {
    /// Mean speed per track classification label; classes with no complete
    /// transit are absent from the map
    pub speed_by_class: BTreeMap<u32, ClassSpeed>,

    /// Headway samples per exit lane
    pub exit_lanes: Vec<LaneHeadways>,

    /// Track ids excluded from the speed aggregate (entry but no
    /// resolvable exit observation)
    pub incomplete_transits: Vec<u64>,
}
