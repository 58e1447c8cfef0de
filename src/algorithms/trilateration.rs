//! Closed-form trilateration for the orthogonal corner layout
//!
//! With anchor A at the origin, B at `(L, 0)`, and C at `(0, L)`, the
//! difference-of-squares identity
//! `|P-Ai|^2 - |P-Aj|^2 = |Ai|^2 - |Aj|^2` collapses to
//!
//! ```text
//! x = (dA^2 - dB^2 + L^2) / (2L)
//! y = (dA^2 - dC^2 + L^2) / (2L)
//! ```
//!
//! This is a restricted special case, not general trilateration: it holds
//! only for that corner placement. Any other layout goes through the
//! iterative least-squares solver instead.

use crate::core::{Point3, Room, CORNER_LAYOUT_TOLERANCE};

/// Check whether three anchor positions form the corner layout the
/// closed-form solve requires, in plan view: slot 0 at the origin, slot 1
/// at `(L, 0)`, slot 2 at `(0, L)` with `L` the room width. Returns the
/// edge length `L` on a match.
pub fn corner_edge(positions: &[Point3], room: &Room) -> Option<f64> {
    if positions.len() != 3 {
        return None;
    }
    let edge = room.width;
    let near = |a: f64, b: f64| (a - b).abs() <= CORNER_LAYOUT_TOLERANCE;

    let origin_ok = near(positions[0].x, 0.0) && near(positions[0].y, 0.0);
    let east_ok = near(positions[1].x, edge) && near(positions[1].y, 0.0);
    let north_ok = near(positions[2].x, 0.0) && near(positions[2].y, edge);

    (origin_ok && east_ok && north_ok && edge > 0.0).then_some(edge)
}

/// Solve the corner-layout system for the planar position, clamped into
/// the room footprint. Distances are in slot order (dA, dB, dC).
pub fn solve_corner(distances: [f64; 3], edge: f64, room: &Room) -> (f64, f64) {
    let [d_a, d_b, d_c] = distances;
    let x = (d_a * d_a - d_b * d_b + edge * edge) / (2.0 * edge);
    let y = (d_a * d_a - d_c * d_c + edge * edge) / (2.0 * edge);
    (x.clamp(0.0, room.width), y.clamp(0.0, room.depth))
}
