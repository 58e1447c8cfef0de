//! Serializable engine configuration
//!
//! A configuration is replaced wholesale: room, anchor layout, master
//! position, and solve mode travel together so an estimate is never
//! computed against a half-updated geometry. The engine echoes back the
//! configuration it actually applied, with any clamping visible.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Point3, Room, DEFAULT_UE_HEIGHT};

/// Anchor declaration: identifier plus mounting position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSpec {
    pub id: String,
    pub position: Point3,
}

impl AnchorSpec {
    pub fn new(id: impl Into<String>, position: Point3) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

/// Estimation dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMode {
    /// 2D solve in the room footprint; the estimate keeps the configured
    /// UE carry height
    Planar,
    /// Full 3D solve
    Spatial,
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub room: Room,
    /// Registration order defines the slot order of `DIST`/`RSSI` records
    pub anchors: Vec<AnchorSpec>,
    pub master: Point3,
    pub mode: SolveMode,
    /// Height above the floor at which the UE is carried (meters)
    pub ue_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let room = Room::default();
        Self {
            anchors: vec![
                AnchorSpec::new("A", Point3::new(0.0, 0.0, 0.0)),
                AnchorSpec::new("B", Point3::new(room.width, 0.0, 0.0)),
                AnchorSpec::new("C", Point3::new(0.0, room.depth, 0.0)),
            ],
            master: Point3::new(room.width / 2.0, room.depth / 2.0, 1.0),
            mode: SolveMode::Planar,
            ue_height: DEFAULT_UE_HEIGHT,
            room,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from its JSON representation
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
            details: e.to_string(),
        })
    }

    /// Serialize the configuration to JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            details: e.to_string(),
        })
    }
}

/// Configuration (de)serialization errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse { details: String },
    Serialize { details: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse { details } => {
                write!(f, "Invalid configuration document: {}", details)
            }
            ConfigError::Serialize { details } => {
                write!(f, "Failed to serialize configuration: {}", details)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_deployment() {
        let config = EngineConfig::default();
        assert_eq!(config.room, Room::new(6.0, 6.0, 3.0));
        assert_eq!(config.anchors.len(), 3);
        assert_eq!(config.anchors[0].id, "A");
        assert_eq!(config.anchors[1].position, Point3::new(6.0, 0.0, 0.0));
        assert_eq!(config.anchors[2].position, Point3::new(0.0, 6.0, 0.0));
        assert_eq!(config.master, Point3::new(3.0, 3.0, 1.0));
        assert_eq!(config.mode, SolveMode::Planar);
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::default();
        let encoded = config.to_json_string().unwrap();
        let decoded = EngineConfig::from_json_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_parse_error_is_recoverable() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
