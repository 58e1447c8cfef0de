//! Room, anchor, and master geometry owned by the engine
//!
//! The store never rejects configuration input: out-of-range coordinates
//! are clamped into the room bounds and invalid room dimensions fall back
//! to the previous values. Whatever was actually applied is observable
//! through the accessors, so a configuration collaborator can echo the
//! corrected values back to its origin.

use nalgebra::Vector3;

use crate::core::{Anchor, MasterNode, Point3, Room, COLLINEARITY_EPSILON};

/// Geometry store: room bounds, registered anchors, master reference
#[derive(Debug, Clone)]
pub struct Geometry {
    room: Room,
    anchors: Vec<Anchor>,
    master: MasterNode,
}

impl Geometry {
    /// Build a store from a room, an ordered anchor layout, and a master
    /// position. Anchor and master coordinates are clamped into the room.
    pub fn new(room: Room, layout: Vec<(String, Point3)>, master: Point3) -> Self {
        let room = sanitize_room(room, Room::default());
        let anchors = layout
            .into_iter()
            .map(|(id, position)| Anchor::new(id, room.clamp(position)))
            .collect();
        Self {
            room,
            anchors,
            master: MasterNode::new(room.clamp(master)),
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn master(&self) -> &MasterNode {
        &self.master
    }

    /// Replace the room dimensions. A non-finite or non-positive dimension
    /// keeps its previous value; anchors and master are re-clamped into the
    /// new bounds. Returns the room that was actually applied.
    pub fn set_room(&mut self, width: f64, depth: f64, height: f64) -> Room {
        let requested = Room::new(width, depth, height);
        let applied = sanitize_room(requested, self.room);
        if applied != requested {
            log::warn!(
                "invalid room dimensions {}x{}x{} corrected to {}x{}x{}",
                width, depth, height, applied.width, applied.depth, applied.height
            );
        }
        self.room = applied;
        for anchor in &mut self.anchors {
            anchor.position = self.room.clamp(anchor.position);
        }
        self.master.position = self.room.clamp(self.master.position);
        self.room
    }

    /// Move an anchor, clamped into the room. Returns the applied position,
    /// or `None` for an unknown id.
    pub fn set_anchor_position(&mut self, id: &str, position: Point3) -> Option<Point3> {
        let clamped = self.room.clamp(position);
        let anchor = self.anchors.iter_mut().find(|a| a.id == id)?;
        anchor.position = clamped;
        Some(clamped)
    }

    /// Move the master node, clamped into the room
    pub fn set_master_position(&mut self, position: Point3) -> Point3 {
        self.master.position = self.room.clamp(position);
        self.master.position
    }

    /// Apply a distance reading to the anchor in registration slot `slot`.
    /// Stored ranges are floored at zero; a non-positive range parks the
    /// anchor until a usable reading arrives.
    pub fn apply_distance(&mut self, slot: usize, value: f64, timestamp: u64) -> Option<&Anchor> {
        let anchor = self.anchors.get_mut(slot)?;
        anchor.last_distance = Some(value.max(0.0));
        anchor.last_updated = Some(timestamp);
        Some(anchor)
    }

    /// Apply a signal-strength reading to the anchor in slot `slot`
    pub fn apply_signal(&mut self, slot: usize, value: f64, timestamp: u64) -> Option<&Anchor> {
        let anchor = self.anchors.get_mut(slot)?;
        anchor.last_signal = Some(value);
        anchor.last_updated = Some(timestamp);
        Some(anchor)
    }

    /// Anchors currently holding a strictly positive range, as
    /// (position, distance) solve sites in registration order
    pub fn ranging_sites(&self) -> Vec<(Point3, f64)> {
        self.anchors
            .iter()
            .filter(|a| a.has_range())
            .map(|a| (a.position, a.last_distance.unwrap_or(0.0)))
            .collect()
    }

    /// Whether every registered anchor currently holds a positive range
    pub fn all_anchors_ranging(&self) -> bool {
        !self.anchors.is_empty() && self.anchors.iter().all(Anchor::has_range)
    }
}

fn sanitize_room(requested: Room, fallback: Room) -> Room {
    let dim = |value: f64, previous: f64| {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            previous
        }
    };
    Room::new(
        dim(requested.width, fallback.width),
        dim(requested.depth, fallback.depth),
        dim(requested.height, fallback.height),
    )
}

/// True when the points span no area: every point lies on the line through
/// the first two. Fewer than three points are trivially collinear.
pub fn points_collinear(points: &[Point3]) -> bool {
    if points.len() < 3 {
        return true;
    }
    let origin = points[0].to_vector3();
    let baseline = match points[1..]
        .iter()
        .map(|p| p.to_vector3() - origin)
        .find(|v| v.norm() > COLLINEARITY_EPSILON)
    {
        Some(v) => v.normalize(),
        // All points coincide
        None => return true,
    };
    points[1..].iter().all(|p| {
        let offset: Vector3<f64> = p.to_vector3() - origin;
        offset.cross(&baseline).norm() <= COLLINEARITY_EPSILON * (1.0 + offset.norm())
    })
}

/// Collinearity of the plan-view (x, y) projection, used by the planar solver
pub fn points_collinear_xy(points: &[Point3]) -> bool {
    let projected: Vec<Point3> = points
        .iter()
        .map(|p| Point3::new(p.x, p.y, 0.0))
        .collect();
    points_collinear(&projected)
}
