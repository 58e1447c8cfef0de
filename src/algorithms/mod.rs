//! Position estimation algorithms

pub mod bearing;
pub mod least_squares;
pub mod trilateration;

pub use bearing::bearing_degrees;
pub use least_squares::DescentSolver;
pub use trilateration::{corner_edge, solve_corner};
