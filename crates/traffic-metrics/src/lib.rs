//! Intersection Traffic Metrics
//!
//! Aggregates per-frame vehicle track records from a fixed camera view into
//! calibrated real-world metrics:
//! - Mean speed per vehicle class inside the intersection
//! - Headway time between consecutive vehicles in each exit lane
//! - Headway distance between consecutive vehicles in each exit lane
//! - Queue length per signal-controlled approach at green onset
//!
//! The workload is batch and single-pass: feed the tracker's record stream
//! through [`TrajectoryAggregator::observe`], then read the report. Masks
//! and the scale factor are immutable after construction.

pub mod aggregator;
pub mod queue;
pub mod report;
pub mod vehicle;

pub use aggregator::TrajectoryAggregator;
pub use queue::{shortest_queue_m, ApproachQueue, QueueConfig, SignalTiming};
pub use report::{ClassSpeed, LaneHeadways, TrafficReport};
pub use vehicle::VehicleState;

use scene_geometry::GeometryError;
use thiserror::Error;

/// Metrics error types
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Scene geometry could not be prepared (calibration, masks)
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Signal timing names an approach the scene does not define
    #[error("No approach {0} in the scene")]
    UnknownApproach(usize),
}
