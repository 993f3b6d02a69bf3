//! Stateful trajectory aggregation
//!
//! Consumes the tracker's record stream in emission order (per-vehicle
//! frame order only; no global sort is assumed) and maintains the running
//! per-vehicle state behind all four metrics.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use scene_geometry::{PixelPoint, RegionMask, ScaleCalibration, SceneConfig, StopLine};
use track_model::DetectionRecord;
use tracing::{debug, info, warn};

use crate::queue::{queue_for_approach, ApproachQueue, QueueConfig, SignalTiming};
use crate::report::{ClassSpeed, LaneHeadways, TrafficReport};
use crate::vehicle::VehicleState;
use crate::MetricsError;

/// First arrival of a vehicle into an exit lane
#[derive(Debug, Clone, Copy)]
struct LaneEntry {
    frame: u64,
    point: PixelPoint,
}

/// The stateful heart of the analysis.
///
/// Built once per scene from the externally supplied configuration; the
/// masks and scale factor are immutable afterwards and the per-vehicle
/// state evolves as records are observed.
pub struct TrajectoryAggregator {
    calibration: ScaleCalibration,
    frame_rate: f64,
    intersection_mask: RegionMask,
    exit_masks: Vec<RegionMask>,
    entrance_masks: Vec<RegionMask>,
    stop_lines: Vec<StopLine>,
    queue_config: QueueConfig,
    /// Transit state keyed by track id
    vehicles: HashMap<u64, VehicleState>,
    /// Per exit lane: first in-lane observation per track id
    lane_entries: Vec<HashMap<u64, LaneEntry>>,
}

impl TrajectoryAggregator {
    /// Prepare masks and calibration for one scene. Calibration failure is
    /// fatal here: no metric has physical units without it.
    pub fn from_scene(scene: &SceneConfig, queue_config: QueueConfig) -> Result<Self, MetricsError> {
        scene.validate()?;
        let exit_masks = scene.exit_masks()?;
        let lane_entries = vec![HashMap::new(); exit_masks.len()];
        Ok(Self {
            calibration: scene.calibration()?,
            frame_rate: scene.frame_rate,
            intersection_mask: scene.intersection_mask()?,
            exit_masks,
            entrance_masks: scene.entrance_masks()?,
            stop_lines: scene.stop_lines_px(),
            queue_config,
            vehicles: HashMap::new(),
            lane_entries,
        })
    }

    pub fn meters_per_pixel(&self) -> f64 {
        self.calibration.meters_per_pixel()
    }

    /// Feed one detection record through the per-vehicle state machine.
    pub fn observe(&mut self, record: &DetectionRecord) {
        let point = record.position();

        // Speed state over the intersection footprint. Positions outside
        // the mask (including out-of-raster detections near frame edges)
        // leave the state untouched.
        if self.intersection_mask.contains(point) {
            match self.vehicles.entry(record.track_id) {
                Entry::Occupied(mut occupied) => {
                    let state = occupied.get_mut();
                    if record.frame < state.latest_frame {
                        warn!(
                            vehicle = record.track_id,
                            frame = record.frame,
                            latest = state.latest_frame,
                            "frame index regressed, skipping observation"
                        );
                    } else {
                        state.update(point, record.frame);
                    }
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(VehicleState::enter(point, record.frame, record.track_class));
                }
            }
        }

        // First arrival into each exit lane drives both headway metrics.
        for (lane, mask) in self.exit_masks.iter().enumerate() {
            if mask.contains(point) {
                self.lane_entries[lane]
                    .entry(record.track_id)
                    .or_insert(LaneEntry {
                        frame: record.frame,
                        point,
                    });
            }
        }
    }

    pub fn observe_all<'a>(&mut self, records: impl IntoIterator<Item = &'a DetectionRecord>) {
        for record in records {
            self.observe(record);
        }
    }

    /// Queue length per approach at the supplied green-onset frames.
    ///
    /// Needs the full record collection again because stationarity is
    /// judged over the frames immediately preceding each onset.
    pub fn queues_at_green(
        &self,
        records: &[DetectionRecord],
        timing: &SignalTiming,
    ) -> Result<Vec<ApproachQueue>, MetricsError> {
        timing
            .iter()
            .map(|(approach, green_frame)| {
                let mask = self
                    .entrance_masks
                    .get(approach)
                    .ok_or(MetricsError::UnknownApproach(approach))?;
                let stop_line = &self.stop_lines[approach];
                Ok(queue_for_approach(
                    records,
                    mask,
                    stop_line,
                    self.calibration,
                    &self.queue_config,
                    approach,
                    green_frame,
                ))
            })
            .collect()
    }

    /// Resolve all per-vehicle state into the final report.
    pub fn finish(self) -> TrafficReport {
        let mut class_samples: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        let mut incomplete_transits = Vec::new();

        for (track_id, state) in &self.vehicles {
            match state.speed_kmh(self.calibration, self.frame_rate) {
                Some(kmh) => class_samples
                    .entry(state.track_class)
                    .or_default()
                    .push(kmh),
                None => incomplete_transits.push(*track_id),
            }
        }
        incomplete_transits.sort_unstable();
        if !incomplete_transits.is_empty() {
            warn!(
                vehicles = ?incomplete_transits,
                "excluding incomplete transits from the speed aggregate"
            );
        }

        let speed_by_class: BTreeMap<u32, ClassSpeed> = class_samples
            .into_iter()
            .map(|(class, samples)| {
                let mean_kmh = samples.iter().sum::<f64>() / samples.len() as f64;
                (
                    class,
                    ClassSpeed {
                        mean_kmh,
                        samples: samples.len(),
                    },
                )
            })
            .collect();

        let mut exit_lanes = Vec::with_capacity(self.lane_entries.len());
        for (lane, entries) in self.lane_entries.iter().enumerate() {
            // Arrival order into the lane; simultaneous entries tie-break
            // by track id to keep the ordering deterministic.
            let mut order: Vec<(u64, LaneEntry)> =
                entries.iter().map(|(&id, &e)| (id, e)).collect();
            order.sort_by_key(|&(id, entry)| (entry.frame, id));

            let headway_times_s: Vec<f64> = order
                .windows(2)
                .map(|pair| (pair[1].1.frame - pair[0].1.frame) as f64 / self.frame_rate)
                .collect();
            let headway_distances_m: Vec<f64> = order
                .windows(2)
                .map(|pair| {
                    self.calibration
                        .pixels_to_meters(pair[0].1.point.distance_to(pair[1].1.point))
                })
                .collect();

            if headway_times_s.is_empty() {
                debug!(lane, "fewer than two lane entries, no headway samples");
            }
            exit_lanes.push(LaneHeadways {
                lane,
                headway_times_s,
                headway_distances_m,
            });
        }

        info!(
            classes = speed_by_class.len(),
            lanes = exit_lanes.len(),
            excluded = incomplete_transits.len(),
            "trajectory aggregation finished"
        );
        TrafficReport {
            speed_by_class,
            exit_lanes,
            incomplete_transits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scene_geometry::NormalizedRegion;
    use track_model::BoundingBox;

    /// 200x200 scene, 0.05 m/px, intersection covering the whole frame,
    /// exit lane 0 on the right half, one approach on the left half with a
    /// stop line at y = 50.
    fn test_scene() -> SceneConfig {
        SceneConfig {
            width: 200,
            height: 200,
            reference_line: NormalizedRegion::new(vec![(0.0, 0.0), (0.5, 0.0)]),
            reference_length_m: 5.0,
            entrance_areas: vec![NormalizedRegion::new(vec![
                (0.0, 0.0),
                (0.5, 0.0),
                (0.5, 1.0),
                (0.0, 1.0),
            ])],
            exit_areas: vec![NormalizedRegion::new(vec![
                (0.5, 0.0),
                (1.0, 0.0),
                (1.0, 1.0),
                (0.5, 1.0),
            ])],
            stop_lines: vec![NormalizedRegion::new(vec![(0.0, 0.25), (0.5, 0.25)])],
            intersection_area: vec![NormalizedRegion::new(vec![
                (0.0, 0.0),
                (1.0, 0.0),
                (1.0, 1.0),
                (0.0, 1.0),
            ])],
            frame_rate: 30.0,
        }
    }

    fn aggregator() -> TrajectoryAggregator {
        TrajectoryAggregator::from_scene(&test_scene(), QueueConfig::default()).unwrap()
    }

    fn rec(frame: u64, track_id: u64, cx: f64, cy: f64, track_class: u32) -> DetectionRecord {
        DetectionRecord {
            frame,
            track_id,
            bbox: BoundingBox::new(cx - 5.0, cy - 5.0, cx + 5.0, cy + 5.0),
            confidence: 0.9,
            class_id: 2,
            track_class,
        }
    }

    #[test]
    fn test_scene_scale_is_5cm_per_pixel() {
        assert!((aggregator().meters_per_pixel() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_mean_speed_two_straight_transits() {
        let mut agg = aggregator();
        // Both cars travel 100 px in 30 frames: 5 m in 1 s = 18 km/h.
        agg.observe_all(&[
            rec(0, 1, 10.0, 10.0, 1),
            rec(10, 2, 50.0, 10.0, 1),
            rec(30, 1, 10.0, 110.0, 1),
            rec(40, 2, 50.0, 110.0, 1),
        ]);
        let report = agg.finish();
        let class = &report.speed_by_class[&1];
        assert_eq!(class.samples, 2);
        assert!((class.mean_kmh - 18.0).abs() < 1e-9);
        assert!(report.incomplete_transits.is_empty());
    }

    #[test]
    fn test_speed_uses_path_length_not_chord() {
        let mut agg = aggregator();
        // A right turn: 100 px east then 100 px south over 30 frames.
        // Path length 200 px = 10 m in 1 s = 36 km/h.
        agg.observe_all(&[
            rec(0, 1, 10.0, 10.0, 1),
            rec(15, 1, 110.0, 10.0, 1),
            rec(30, 1, 110.0, 110.0, 1),
        ]);
        let report = agg.finish();
        assert!((report.speed_by_class[&1].mean_kmh - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_entry_only_vehicle_excluded() {
        let mut agg = aggregator();
        agg.observe_all(&[
            rec(0, 1, 10.0, 10.0, 1),
            rec(30, 1, 10.0, 110.0, 1),
            rec(5, 9, 20.0, 20.0, 1),
        ]);
        let report = agg.finish();
        // Vehicle 9 entered but never updated: no sample, listed as excluded.
        assert_eq!(report.speed_by_class[&1].samples, 1);
        assert_eq!(report.incomplete_transits, vec![9]);
    }

    #[test]
    fn test_speeds_grouped_by_class() {
        let mut agg = aggregator();
        agg.observe_all(&[
            rec(0, 1, 10.0, 10.0, 1),
            rec(30, 1, 10.0, 110.0, 1),
            rec(0, 2, 50.0, 10.0, 3),
            rec(30, 2, 50.0, 60.0, 3),
        ]);
        let report = agg.finish();
        assert!((report.speed_by_class[&1].mean_kmh - 18.0).abs() < 1e-9);
        assert!((report.speed_by_class[&3].mean_kmh - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_raster_detection_ignored() {
        let mut agg = aggregator();
        agg.observe_all(&[
            rec(0, 1, 10.0, 10.0, 1),
            // Far outside the 200x200 raster: not contained, not fatal.
            rec(15, 1, 900.0, 900.0, 1),
            rec(30, 1, 10.0, 110.0, 1),
        ]);
        let report = agg.finish();
        assert!((report.speed_by_class[&1].mean_kmh - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_regressed_frame_skipped() {
        let mut agg = aggregator();
        agg.observe_all(&[
            rec(0, 1, 10.0, 10.0, 1),
            rec(30, 1, 10.0, 110.0, 1),
            // Tracker glitch: earlier frame after a later one.
            rec(20, 1, 10.0, 60.0, 1),
        ]);
        let report = agg.finish();
        assert!((report.speed_by_class[&1].mean_kmh - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_headway_times_per_lane() {
        let mut agg = aggregator();
        // Three vehicles cross into exit lane 0 at frames 30, 90, 105.
        agg.observe_all(&[
            rec(30, 1, 150.0, 100.0, 1),
            rec(90, 2, 150.0, 160.0, 1),
            rec(105, 3, 150.0, 40.0, 1),
        ]);
        let report = agg.finish();
        let lane = &report.exit_lanes[0];
        assert_eq!(lane.headway_times_s, vec![2.0, 0.5]);
    }

    #[test]
    fn test_headway_distances_per_lane() {
        let mut agg = aggregator();
        // Entry positions 60 px apart vertically: 3 m at 0.05 m/px.
        agg.observe_all(&[
            rec(30, 1, 150.0, 100.0, 1),
            rec(90, 2, 150.0, 160.0, 1),
        ]);
        let report = agg.finish();
        let lane = &report.exit_lanes[0];
        assert_eq!(lane.headway_distances_m.len(), 1);
        assert!((lane.headway_distances_m[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_headway_only_counts_first_lane_entry() {
        let mut agg = aggregator();
        // Vehicle 1 stays in the lane across several frames; only its
        // first arrival participates in the ordering.
        agg.observe_all(&[
            rec(30, 1, 150.0, 100.0, 1),
            rec(45, 1, 150.0, 120.0, 1),
            rec(90, 2, 150.0, 160.0, 1),
        ]);
        let report = agg.finish();
        assert_eq!(report.exit_lanes[0].headway_times_s, vec![2.0]);
    }

    #[test]
    fn test_simultaneous_entries_tie_break_by_id() {
        let mut agg = aggregator();
        agg.observe_all(&[
            rec(60, 7, 150.0, 100.0, 1),
            rec(60, 3, 150.0, 160.0, 1),
        ]);
        let report = agg.finish();
        let lane = &report.exit_lanes[0];
        assert_eq!(lane.headway_times_s, vec![0.0]);
        // Order is id 3 then id 7, so the gap measures 3 -> 7.
        assert!((lane.headway_distances_m[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_lane_has_no_samples() {
        let report = aggregator().finish();
        assert_eq!(report.exit_lanes.len(), 1);
        assert!(report.exit_lanes[0].headway_times_s.is_empty());
        assert!(report.exit_lanes[0].headway_distances_m.is_empty());
    }

    #[test]
    fn test_queue_length_rearmost_stationary_vehicle() {
        let agg = aggregator();
        let mut records = Vec::new();
        // Vehicles 1 and 2 hold still in the entrance area through the
        // onset window; stop line is at y = 50.
        for frame in (85..=100).step_by(5) {
            records.push(rec(frame, 1, 20.0, 120.0, 1));
            records.push(rec(frame, 2, 20.0, 160.0, 1));
            // Vehicle 3 rolls forward and must not count as queued.
            records.push(rec(frame, 3, 60.0, 190.0 - (frame as f64 - 85.0) * 4.0, 1));
        }
        let timing: SignalTiming = [(0usize, 100u64)].into_iter().collect();
        let queues = agg.queues_at_green(&records, &timing).unwrap();
        assert_eq!(queues.len(), 1);
        let q = &queues[0];
        assert_eq!(q.queued_vehicles, vec![1, 2]);
        // Rearmost is vehicle 2: 110 px behind the stop line = 5.5 m.
        assert!((q.queue_m.unwrap() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_queue_empty_is_absent_not_zero() {
        let agg = aggregator();
        let timing: SignalTiming = [(0usize, 100u64)].into_iter().collect();
        let queues = agg.queues_at_green(&[], &timing).unwrap();
        assert_eq!(queues[0].queue_m, None);
        assert!(queues[0].queued_vehicles.is_empty());
    }

    #[test]
    fn test_queue_unknown_approach_rejected() {
        let agg = aggregator();
        let timing: SignalTiming = [(5usize, 100u64)].into_iter().collect();
        let err = agg.queues_at_green(&[], &timing).unwrap_err();
        assert!(matches!(err, MetricsError::UnknownApproach(5)));
    }

    proptest! {
        #[test]
        fn prop_headway_times_non_negative(frames in proptest::collection::vec(0u64..10_000, 2..20)) {
            let mut agg = aggregator();
            for (i, &frame) in frames.iter().enumerate() {
                // One record per vehicle, all inside exit lane 0.
                agg.observe(&rec(frame, i as u64 + 1, 150.0, 100.0, 1));
            }
            let report = agg.finish();
            let lane = &report.exit_lanes[0];
            prop_assert_eq!(lane.headway_times_s.len(), frames.len() - 1);
            prop_assert!(lane.headway_times_s.iter().all(|&s| s >= 0.0));
        }
    }
}
