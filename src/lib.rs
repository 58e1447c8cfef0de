//! Indoor UE positioning engine
//!
//! Estimates the position of a mobile receiver inside a bounded room from
//! ranging records streamed by fixed anchors. The transport delivers
//! newline-delimited ASCII `DIST`/`RSSI` records in arbitrary fragments;
//! the engine decodes them, maintains anchor state, and solves for the
//! receiver position with a closed-form corner trilateration where the
//! layout allows it and an iterative least-squares refinement everywhere
//! else. Observers are notified with a fresh snapshot after every
//! accepted recompute.

pub mod algorithms;
pub mod config;
pub mod core;
pub mod engine;
pub mod geometry;
pub mod link;
pub mod processing;
pub mod publisher;

// Re-export commonly used types
pub use algorithms::{bearing_degrees, DescentSolver};
pub use config::{AnchorSpec, ConfigError, EngineConfig, SolveMode};
pub use crate::core::{
    Anchor, MasterNode, Point3, PositionEstimate, Reading, ReadingKind, Room, SolveBasis,
};
pub use engine::PositioningEngine;
pub use geometry::Geometry;
pub use link::{
    shared_engine, spawn_reader, LinkError, LinkResult, MockLink, RangeLink, ReaderHandle,
    SharedEngine,
};
pub use processing::{LineDecoder, RangeRecord};
pub use publisher::{EngineSnapshot, EstimatePublisher, SnapshotCallback, SubscriberHandle};
