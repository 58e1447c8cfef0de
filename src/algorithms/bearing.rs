//! Bearing from the master node to the current estimate

use crate::core::Point3;

/// Plan-view bearing from `master` to `estimate` in degrees, measured from
/// the positive x-axis and normalized into `[0, 360)`.
pub fn bearing_degrees(master: &Point3, estimate: &Point3) -> f64 {
    (estimate.y - master.y)
        .atan2(estimate.x - master.x)
        .to_degrees()
        .rem_euclid(360.0)
}
