//! Core data types for the positioning engine

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 3D point in room coordinates (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance to another point ignoring the z axis
    pub fn planar_distance_to(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_vector3(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn from_vector3(v: &Vector3<f64>) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

/// Bounded room the UE moves in. All coordinates are expected to lie
/// within `[0,width] x [0,depth] x [0,height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Room {
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self { width, depth, height }
    }

    /// Clamp a point into the room bounds. A NaN coordinate lands on the
    /// room origin rather than propagating through the solver.
    pub fn clamp(&self, p: Point3) -> Point3 {
        let axis = |v: f64, limit: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, limit) };
        Point3 {
            x: axis(p.x, self.width),
            y: axis(p.y, self.depth),
            z: axis(p.z, self.height),
        }
    }

    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= 0.0
            && p.x <= self.width
            && p.y >= 0.0
            && p.y <= self.depth
            && p.z >= 0.0
            && p.z <= self.height
    }

    /// Geometric center of the room volume
    pub fn centroid(&self) -> Point3 {
        Point3 {
            x: self.width / 2.0,
            y: self.depth / 2.0,
            z: self.height / 2.0,
        }
    }
}

impl Default for Room {
    fn default() -> Self {
        Self {
            width: crate::core::DEFAULT_ROOM_WIDTH,
            depth: crate::core::DEFAULT_ROOM_DEPTH,
            height: crate::core::DEFAULT_ROOM_HEIGHT,
        }
    }
}

/// Fixed reference point with known coordinates used to range the UE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: String,
    pub position: Point3,
    /// Most recent range report (meters), unset until the first reading
    pub last_distance: Option<f64>,
    /// Most recent signal strength report (dBm)
    pub last_signal: Option<f64>,
    /// Timestamp of the last reading applied to this anchor (ms)
    pub last_updated: Option<u64>,
}

impl Anchor {
    pub fn new(id: impl Into<String>, position: Point3) -> Self {
        Self {
            id: id.into(),
            position,
            last_distance: None,
            last_signal: None,
            last_updated: None,
        }
    }

    /// Whether this anchor currently holds a usable range report
    pub fn has_range(&self) -> bool {
        matches!(self.last_distance, Some(d) if d > 0.0)
    }
}

/// Fixed reference node used only to derive a relative bearing to the UE
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasterNode {
    pub position: Point3,
}

impl MasterNode {
    pub fn new(position: Point3) -> Self {
        Self { position }
    }
}

/// Kind of a decoded ranging report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingKind {
    Distance,
    Signal,
}

/// Single validated reading applied to one anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub anchor_id: String,
    pub kind: ReadingKind,
    pub value: f64,
    pub timestamp: u64,
}

/// Which solve path produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveBasis {
    /// Corner-layout closed-form trilateration
    ClosedForm,
    /// Gradient-descent least-squares refinement
    Iterative,
}

/// Immutable position fix. A new estimate replaces the previous one
/// wholesale; it is never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    pub position: Point3,
    /// Sum-of-squares range error remaining at the solution
    pub residual: f64,
    pub basis: SolveBasis,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(a.distance_to(&b), 5.0);
        assert_relative_eq!(a.planar_distance_to(&b), 5.0);

        let c = Point3::new(3.0, 4.0, 12.0);
        assert_relative_eq!(a.distance_to(&c), 13.0);
        assert_relative_eq!(a.planar_distance_to(&c), 5.0);
    }

    #[test]
    fn test_room_clamp() {
        let room = Room::new(6.0, 6.0, 3.0);
        let inside = room.clamp(Point3::new(2.0, 3.0, 1.0));
        assert_eq!(inside, Point3::new(2.0, 3.0, 1.0));

        let outside = room.clamp(Point3::new(-1.0, 7.5, 10.0));
        assert_eq!(outside, Point3::new(0.0, 6.0, 3.0));
        assert!(room.contains(&outside));

        let poisoned = room.clamp(Point3::new(f64::NAN, f64::INFINITY, 1.0));
        assert_eq!(poisoned, Point3::new(0.0, 6.0, 1.0));
    }

    #[test]
    fn test_room_centroid() {
        let room = Room::new(6.0, 4.0, 2.0);
        assert_eq!(room.centroid(), Point3::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn test_anchor_has_range() {
        let mut anchor = Anchor::new("A", Point3::origin());
        assert!(!anchor.has_range());

        anchor.last_distance = Some(0.0);
        assert!(!anchor.has_range());

        anchor.last_distance = Some(2.5);
        assert!(anchor.has_range());
    }
}
