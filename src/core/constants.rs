//! System parameters and solver tuning constants

/// Default room edge lengths (meters), matching the reference deployment
pub const DEFAULT_ROOM_WIDTH: f64 = 6.0;
pub const DEFAULT_ROOM_DEPTH: f64 = 6.0;
pub const DEFAULT_ROOM_HEIGHT: f64 = 3.0;

/// Default height of the mobile receiver above the floor (meters)
pub const DEFAULT_UE_HEIGHT: f64 = 0.3;

/// Fixed iteration budget for the gradient-descent solver
pub const SOLVER_ITERATIONS: usize = 50;

/// Fixed learning rate for the gradient-descent solver
pub const SOLVER_STEP: f64 = 0.1;

/// Floor applied to anchor-estimate distances before dividing, so an
/// estimate coinciding with an anchor never produces a singular gradient
pub const RANGE_EPSILON: f64 = 1e-3;

/// Positional tolerance when matching anchors against the orthogonal
/// corner layout required by the closed-form solve
pub const CORNER_LAYOUT_TOLERANCE: f64 = 1e-6;

/// Threshold on the normalized spanned area below which an anchor set is
/// treated as collinear
pub const COLLINEARITY_EPSILON: f64 = 1e-9;

/// Minimum numeric fields a ranging record must carry to be accepted
pub const MIN_RECORD_VALUES: usize = 3;

/// Upper bound on buffered unterminated input before it is discarded
pub const MAX_CARRY_BYTES: usize = 4096;
