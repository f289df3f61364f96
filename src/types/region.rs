//! Shared memory region identity and connection state

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three shared memory regions published by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// High-rate car physics (`acpmf_physics`)
    Physics,
    /// Session and HUD state (`acpmf_graphics`)
    Graphics,
    /// Session-constant car and track data (`acpmf_static`)
    StaticInfo,
}

impl RegionKind {
    /// All regions in the order they are opened and first read.
    pub const ALL: [RegionKind; 3] =
        [RegionKind::StaticInfo, RegionKind::Graphics, RegionKind::Physics];

    /// Short region name as used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Physics => "acpmf_physics",
            RegionKind::Graphics => "acpmf_graphics",
            RegionKind::StaticInfo => "acpmf_static",
        }
    }

    /// Full kernel object name passed to `OpenFileMappingW`.
    pub fn mapping_name(self) -> &'static str {
        match self {
            RegionKind::Physics => "Local\\acpmf_physics",
            RegionKind::Graphics => "Local\\acpmf_graphics",
            RegionKind::StaticInfo => "Local\\acpmf_static",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-size byte block copied out of one region at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSnapshot {
    pub kind: RegionKind,
    pub bytes: Vec<u8>,
}

impl RawSnapshot {
    pub fn new(kind: RegionKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }
}

/// Connector state, written only by the connector task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(label)
    }
}
