//! Positioning engine: the single owner of all estimation state
//!
//! One `PositioningEngine` value holds the geometry store, the stream
//! decoder, the solver, the current estimate, and the observer registry.
//! Every operation takes the engine by reference; there is no ambient
//! state. Callers that share the engine across threads wrap it in the
//! mutex provided by [`crate::link::shared_engine`], which also serializes
//! configuration replaces against reading-driven recomputes.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::algorithms::{bearing_degrees, trilateration, DescentSolver};
use crate::config::{AnchorSpec, EngineConfig, SolveMode};
use crate::core::{
    Point3, PositionEstimate, Reading, ReadingKind, Room, SolveBasis, DEFAULT_UE_HEIGHT,
};
use crate::geometry::{points_collinear, points_collinear_xy, Geometry};
use crate::processing::{LineDecoder, RangeRecord};
use crate::publisher::{EngineSnapshot, EstimatePublisher, SnapshotCallback, SubscriberHandle};

/// Streaming positioning engine
pub struct PositioningEngine {
    geometry: Geometry,
    decoder: LineDecoder,
    solver: DescentSolver,
    mode: SolveMode,
    ue_height: f64,
    estimate: Option<PositionEstimate>,
    publisher: EstimatePublisher,
}

impl PositioningEngine {
    pub fn new(config: EngineConfig) -> Self {
        let mut engine = Self {
            geometry: Geometry::new(Room::default(), Vec::new(), Point3::origin()),
            decoder: LineDecoder::new(),
            solver: DescentSolver::default(),
            mode: SolveMode::Planar,
            ue_height: DEFAULT_UE_HEIGHT,
            estimate: None,
            publisher: EstimatePublisher::new(),
        };
        engine.apply_config(config);
        engine
    }

    /// Replace the whole configuration atomically and return what was
    /// actually applied, with any clamping or defaulting visible to the
    /// configuration-origin collaborator.
    ///
    /// Anchors are recreated, so pending readings are discarded; the last
    /// estimate is retained until new readings produce a fresh one.
    pub fn apply_config(&mut self, config: EngineConfig) -> EngineConfig {
        let layout = config
            .anchors
            .into_iter()
            .map(|spec| (spec.id, spec.position))
            .collect();
        self.geometry = Geometry::new(config.room, layout, config.master);
        self.mode = config.mode;
        let ceiling = self.geometry.room().height;
        self.ue_height = if config.ue_height.is_finite() {
            config.ue_height.clamp(0.0, ceiling)
        } else {
            DEFAULT_UE_HEIGHT.min(ceiling)
        };
        self.config()
    }

    /// The configuration currently in effect (post-clamping)
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            room: *self.geometry.room(),
            anchors: self
                .geometry
                .anchors()
                .iter()
                .map(|a| AnchorSpec::new(a.id.clone(), a.position))
                .collect(),
            master: self.geometry.master().position,
            mode: self.mode,
            ue_height: self.ue_height,
        }
    }

    /// Replace the room dimensions; returns the applied room
    pub fn set_room(&mut self, width: f64, depth: f64, height: f64) -> Room {
        let applied = self.geometry.set_room(width, depth, height);
        self.ue_height = self.ue_height.min(applied.height);
        applied
    }

    /// Move an anchor; returns the applied (clamped) position
    pub fn set_anchor_position(&mut self, id: &str, position: Point3) -> Option<Point3> {
        self.geometry.set_anchor_position(id, position)
    }

    /// Move the master node; returns the applied (clamped) position
    pub fn set_master_position(&mut self, position: Point3) -> Point3 {
        self.geometry.set_master_position(position)
    }

    /// Ingest a chunk of transport bytes. Decoded readings are applied to
    /// the geometry store immediately; each complete distance record
    /// triggers one recompute, and accepted recomputes notify observers.
    /// Returns the readings accepted from this chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Reading> {
        let records = self.decoder.feed(chunk);
        let mut readings = Vec::new();

        for record in records {
            let timestamp = now_ms();
            match record {
                RangeRecord::Distances(values) => {
                    self.apply_record(&values, ReadingKind::Distance, timestamp, &mut readings);
                    self.recompute(timestamp);
                }
                RangeRecord::Signals(values) => {
                    self.apply_record(&values, ReadingKind::Signal, timestamp, &mut readings);
                }
            }
        }

        readings
    }

    fn apply_record(
        &mut self,
        values: &[f64],
        kind: ReadingKind,
        timestamp: u64,
        readings: &mut Vec<Reading>,
    ) {
        // Values map to anchors in registration order; surplus slots are
        // ignored
        let slots = values.len().min(self.geometry.anchor_count());
        for (slot, &value) in values.iter().take(slots).enumerate() {
            let applied = match kind {
                ReadingKind::Distance => self.geometry.apply_distance(slot, value, timestamp),
                ReadingKind::Signal => self.geometry.apply_signal(slot, value, timestamp),
            };
            if let Some(anchor) = applied {
                readings.push(Reading {
                    anchor_id: anchor.id.clone(),
                    kind,
                    value,
                    timestamp,
                });
            }
        }
    }

    fn recompute(&mut self, timestamp: u64) {
        let solved = match self.mode {
            SolveMode::Planar => self.solve_planar(timestamp),
            SolveMode::Spatial => self.solve_spatial(timestamp),
        };
        match solved {
            Some(estimate) => {
                self.estimate = Some(estimate);
                let snapshot = self.snapshot();
                self.publisher.notify(&snapshot);
            }
            // Expected steady state while readings are still incomplete
            None => log::trace!("recompute declined, retaining previous estimate"),
        }
    }

    fn solve_planar(&self, timestamp: u64) -> Option<PositionEstimate> {
        let room = *self.geometry.room();
        let anchors = self.geometry.anchors();

        // The closed form applies only to the exact three-anchor corner
        // placement; everything else refines iteratively
        if anchors.len() == 3 {
            let positions: Vec<Point3> = anchors.iter().map(|a| a.position).collect();
            if let Some(edge) = trilateration::corner_edge(&positions, &room) {
                if !self.geometry.all_anchors_ranging() {
                    return None;
                }
                let distances = [
                    anchors[0].last_distance?,
                    anchors[1].last_distance?,
                    anchors[2].last_distance?,
                ];
                let (x, y) = trilateration::solve_corner(distances, edge, &room);
                let position = Point3::new(x, y, self.ue_height);
                let sites = self.solver_sites();
                let residual = self.solver.residual(&sites, &position.to_vector3(), true);
                return Some(PositionEstimate {
                    position,
                    residual,
                    basis: SolveBasis::ClosedForm,
                    timestamp,
                });
            }
        }

        let ranging = self.geometry.ranging_sites();
        if ranging.len() < 3 {
            return None;
        }
        let participating: Vec<Point3> = ranging.iter().map(|(p, _)| *p).collect();
        if points_collinear_xy(&participating) {
            log::debug!("planar anchor geometry is collinear, declining solve");
            return None;
        }

        let mut start = room.centroid().to_vector3();
        start.z = self.ue_height;
        let (solved, residual) = self.solver.solve(&self.solver_sites(), start, true);
        Some(PositionEstimate {
            position: Point3::from_vector3(&solved),
            residual,
            basis: SolveBasis::Iterative,
            timestamp,
        })
    }

    fn solve_spatial(&self, timestamp: u64) -> Option<PositionEstimate> {
        let ranging = self.geometry.ranging_sites();
        if ranging.len() < 3 {
            return None;
        }
        let participating: Vec<Point3> = ranging.iter().map(|(p, _)| *p).collect();
        if points_collinear(&participating) {
            log::debug!("anchor geometry is collinear, declining solve");
            return None;
        }

        let start = self.geometry.room().centroid().to_vector3();
        let (solved, residual) = self.solver.solve(&self.solver_sites(), start, false);
        Some(PositionEstimate {
            position: Point3::from_vector3(&solved),
            residual,
            basis: SolveBasis::Iterative,
            timestamp,
        })
    }

    fn solver_sites(&self) -> Vec<(nalgebra::Vector3<f64>, f64)> {
        self.geometry
            .ranging_sites()
            .iter()
            .map(|(p, d)| (p.to_vector3(), *d))
            .collect()
    }

    pub fn estimate(&self) -> Option<&PositionEstimate> {
        self.estimate.as_ref()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Plan-view bearing from the master node to the current estimate,
    /// `None` until an estimate exists
    pub fn bearing_from_master(&self) -> Option<f64> {
        self.estimate
            .as_ref()
            .map(|e| bearing_degrees(&self.geometry.master().position, &e.position))
    }

    /// Read-only view for render/configuration collaborators
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            estimate: self.estimate.clone(),
            anchors: self.geometry.anchors().to_vec(),
            room: *self.geometry.room(),
            master: *self.geometry.master(),
        }
    }

    /// Register an observer notified after each accepted recompute
    pub fn subscribe(&mut self, callback: SnapshotCallback) -> SubscriberHandle {
        self.publisher.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, handle: SubscriberHandle) -> bool {
        self.publisher.unsubscribe(handle)
    }
}

impl Default for PositioningEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn corner_engine() -> PositioningEngine {
        PositioningEngine::new(EngineConfig::default())
    }

    #[test]
    fn test_equidistant_readings_place_ue_at_room_center() {
        let mut engine = corner_engine();
        let readings = engine.feed(b"DIST 4.2426 4.2426 4.2426\n");
        assert_eq!(readings.len(), 3);

        let estimate = engine.estimate().expect("estimate after full reading set");
        assert_relative_eq!(estimate.position.x, 3.0, epsilon = 1e-3);
        assert_relative_eq!(estimate.position.y, 3.0, epsilon = 1e-3);
        assert_eq!(estimate.position.z, 0.3);
        assert_eq!(estimate.basis, SolveBasis::ClosedForm);
    }

    #[test]
    fn test_closed_form_recovers_exact_position() {
        let mut engine = corner_engine();
        let truth = Point3::new(1.5, 2.5, 0.0);
        let config = engine.config();
        let line = format!(
            "DIST {} {} {}\n",
            truth.planar_distance_to(&config.anchors[0].position),
            truth.planar_distance_to(&config.anchors[1].position),
            truth.planar_distance_to(&config.anchors[2].position),
        );
        engine.feed(line.as_bytes());

        let estimate = engine.estimate().unwrap();
        assert_relative_eq!(estimate.position.x, truth.x, epsilon = 1e-6);
        assert_relative_eq!(estimate.position.y, truth.y, epsilon = 1e-6);
        assert!(estimate.residual < 1e-9);
    }

    #[test]
    fn test_idempotent_readings() {
        let mut engine = corner_engine();
        engine.feed(b"DIST 2.0 5.0 5.0\n");
        let first = engine.estimate().unwrap().position;
        engine.feed(b"DIST 2.0 5.0 5.0\n");
        let second = engine.estimate().unwrap().position;
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunk_split_matches_single_delivery() {
        let line = b"DIST 2.0 5.0 5.0\n";
        let mut whole = corner_engine();
        whole.feed(line);

        let mut split = corner_engine();
        assert!(split.feed(&line[..7]).is_empty());
        assert!(split.estimate().is_none());
        let readings = split.feed(&line[7..]);
        assert_eq!(readings.len(), 3);

        assert_eq!(
            whole.estimate().unwrap().position,
            split.estimate().unwrap().position
        );
    }

    #[test]
    fn test_malformed_lines_do_not_stall_the_stream() {
        let mut engine = corner_engine();
        let readings = engine.feed(b"DIST 1 2\nGARBAGE\nDIST 1 2 3\n");
        assert_eq!(readings.len(), 3);
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert!(engine.estimate().is_some());
    }

    #[test]
    fn test_declines_below_three_positive_distances() {
        let mut engine = corner_engine();
        // Anchor C reports zero range: only two usable distances
        engine.feed(b"DIST 2.0 5.0 0\n");
        assert!(engine.estimate().is_none());

        // A previously accepted estimate must survive a later bad set
        engine.feed(b"DIST 2.0 5.0 5.0\n");
        let accepted = engine.estimate().unwrap().clone();
        engine.feed(b"DIST 9.0 9.0 0\n");
        assert_eq!(*engine.estimate().unwrap(), accepted);
    }

    #[test]
    fn test_signal_records_update_state_without_recompute() {
        let mut engine = corner_engine();
        let readings = engine.feed(b"RSSI -58 -63 -71\n");
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].kind, ReadingKind::Signal);
        assert!(engine.estimate().is_none());

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.anchors[1].last_signal, Some(-63.0));
        assert_eq!(snapshot.anchors[1].last_distance, None);
    }

    #[test]
    fn test_surplus_values_are_ignored() {
        let mut engine = corner_engine();
        let readings = engine.feed(b"DIST 2.0 5.0 5.0 7.5\n");
        assert_eq!(readings.len(), 3);
    }

    #[test]
    fn test_non_corner_layout_uses_iterative_solver() {
        let mut config = EngineConfig::default();
        config.anchors[2].position = Point3::new(3.0, 5.0, 0.0);
        let mut engine = PositioningEngine::new(config.clone());

        let truth = Point3::new(2.0, 2.0, 0.0);
        let line = format!(
            "DIST {} {} {}\n",
            truth.planar_distance_to(&config.anchors[0].position),
            truth.planar_distance_to(&config.anchors[1].position),
            truth.planar_distance_to(&config.anchors[2].position),
        );
        engine.feed(line.as_bytes());

        let estimate = engine.estimate().unwrap();
        assert_eq!(estimate.basis, SolveBasis::Iterative);
        assert!(estimate.position.planar_distance_to(&truth) < 0.15);
        assert_eq!(estimate.position.z, 0.3);
    }

    #[test]
    fn test_collinear_layout_declines() {
        let mut config = EngineConfig::default();
        config.anchors[0].position = Point3::new(0.0, 2.0, 0.0);
        config.anchors[1].position = Point3::new(3.0, 2.0, 0.0);
        config.anchors[2].position = Point3::new(6.0, 2.0, 0.0);
        let mut engine = PositioningEngine::new(config);

        engine.feed(b"DIST 2.0 2.0 2.0\n");
        assert!(engine.estimate().is_none());
    }

    #[test]
    fn test_spatial_mode_solves_in_three_dimensions() {
        let config = EngineConfig {
            room: Room::new(6.0, 6.0, 3.0),
            anchors: vec![
                AnchorSpec::new("A", Point3::new(0.0, 0.0, 0.0)),
                AnchorSpec::new("B", Point3::new(6.0, 0.0, 0.0)),
                AnchorSpec::new("C", Point3::new(0.0, 6.0, 0.0)),
                AnchorSpec::new("D", Point3::new(6.0, 6.0, 2.5)),
            ],
            master: Point3::new(3.0, 3.0, 1.0),
            mode: SolveMode::Spatial,
            ue_height: 0.3,
        };
        let mut engine = PositioningEngine::new(config.clone());

        let truth = Point3::new(2.2, 3.7, 1.1);
        let distances: Vec<String> = config
            .anchors
            .iter()
            .map(|a| truth.distance_to(&a.position).to_string())
            .collect();
        engine.feed(format!("DIST {}\n", distances.join(" ")).as_bytes());

        let estimate = engine.estimate().unwrap();
        assert_eq!(estimate.basis, SolveBasis::Iterative);
        assert!(estimate.position.distance_to(&truth) < 0.5);
    }

    #[test]
    fn test_observers_notified_only_on_accepted_recompute() {
        let mut engine = corner_engine();
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notifications);
        engine.subscribe(Box::new(move |snapshot| {
            assert!(snapshot.estimate.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        engine.feed(b"RSSI -58 -63 -71\n");
        engine.feed(b"DIST 2.0 5.0 0\n");
        assert_eq!(notifications.load(Ordering::SeqCst), 0);

        engine.feed(b"DIST 2.0 5.0 5.0\n");
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        engine.feed(b"DIST 2.1 5.0 5.0\nDIST 2.2 5.0 5.0\n");
        assert_eq!(notifications.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_apply_config_echoes_corrections() {
        let mut engine = corner_engine();
        let mut requested = EngineConfig::default();
        requested.anchors[1].position = Point3::new(9.0, -2.0, 0.0);
        requested.master = Point3::new(3.0, 3.0, 99.0);
        requested.ue_height = -1.0;

        let applied = engine.apply_config(requested);
        assert_eq!(applied.anchors[1].position, Point3::new(6.0, 0.0, 0.0));
        assert_eq!(applied.master, Point3::new(3.0, 3.0, 3.0));
        assert_eq!(applied.ue_height, 0.0);
    }

    #[test]
    fn test_apply_config_discards_pending_readings_keeps_estimate() {
        let mut engine = corner_engine();
        engine.feed(b"DIST 2.0 5.0 5.0\n");
        let before = engine.estimate().unwrap().clone();

        engine.apply_config(EngineConfig::default());
        assert!(engine.snapshot().anchors.iter().all(|a| !a.has_range()));
        assert_eq!(*engine.estimate().unwrap(), before);
    }

    #[test]
    fn test_bearing_from_master() {
        let mut config = EngineConfig::default();
        config.master = Point3::new(4.0, 4.0, 0.0);
        let mut engine = PositioningEngine::new(config);
        assert!(engine.bearing_from_master().is_none());

        // Equidistant set resolves to (3, 3): one unit south-west of the
        // master in plan view
        engine.feed(b"DIST 4.2426 4.2426 4.2426\n");
        let bearing = engine.bearing_from_master().unwrap();
        assert_relative_eq!(bearing, 225.0, epsilon = 1e-3);
    }

    #[test]
    fn test_partial_trailing_line_does_not_recompute() {
        let mut engine = corner_engine();
        engine.feed(b"DIST 2.0 5.0 5.0\nDIST 9.9 9.9");
        let estimate = engine.estimate().unwrap().clone();
        assert_relative_eq!(estimate.position.x, 1.0, epsilon = 0.5);

        // Completing the buffered line applies it as one record
        engine.feed(b" 9.9\n");
        assert_ne!(*engine.estimate().unwrap(), estimate);
    }
}
