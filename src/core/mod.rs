//! Core types and constants for the indoor positioning engine

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::*;
