//! Error types for telemetry acquisition and relay.
//!
//! All errors implement the `std::error::Error` trait and carry enough context
//! to decide how the acquisition loop should react.
//!
//! ## Error Categories
//!
//! - **Recoverable absence**: the simulator is not running, or has not created
//!   its shared memory yet. This is the normal idle state and is retried forever.
//! - **Poll failures**: a single read or decode failed. The poll is skipped and
//!   the next scheduled tick tries again.
//! - **Fatal configuration errors**: a region exists but cannot be used (access
//!   denied, layout smaller than the compiled record, unsupported platform).
//!   The acquisition subsystem stops and reports the error.
//!
//! ```rust
//! use acrelay::{RegionKind, TelemetryError};
//!
//! let error = TelemetryError::region_absent(RegionKind::Physics);
//! assert!(error.is_absence());
//! assert!(!error.is_fatal());
//!
//! let error = TelemetryError::layout_mismatch(RegionKind::Graphics, 296, 128);
//! assert!(error.is_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::RegionKind;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for relay operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for relay operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Shared memory region {region} does not exist (simulator not running?)")]
    RegionAbsent { region: RegionKind },

    #[error("Cannot access shared memory region {region}: {reason}")]
    RegionAccess {
        region: RegionKind,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Layout mismatch for {region}: expected {expected} bytes, found {found}")]
    Layout { region: RegionKind, expected: usize, found: usize },

    #[error("Decode error in {region}: {details}")]
    Decode { region: RegionKind, details: String },

    #[error("Reading {region} timed out after {duration:?}")]
    Timeout { region: RegionKind, duration: Duration },

    #[error("Configuration error in {}: {details}", path.display())]
    Config {
        path: PathBuf,
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Snapshot serialization failed")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Transport to {target} failed")]
    Transport {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task {task} failed: {details}")]
    Task { task: &'static str, details: String },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Windows API error: {operation}")]
    #[cfg(windows)]
    WindowsApi {
        operation: String,
        #[source]
        source: core::Error,
    },
}

impl TelemetryError {
    /// Returns whether this error only means the simulator is not running.
    pub fn is_absence(&self) -> bool {
        matches!(self, TelemetryError::RegionAbsent { .. })
    }

    /// Returns whether the failed operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::RegionAbsent { .. } => true,
            TelemetryError::Decode { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::Transport { .. } => true,
            TelemetryError::RegionAccess { .. } => false,
            TelemetryError::Layout { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::Serialization { .. } => false,
            TelemetryError::Task { .. } => false,
            TelemetryError::UnsupportedPlatform { .. } => false,
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => false,
        }
    }

    /// Returns whether this error must stop the acquisition subsystem.
    ///
    /// Only errors raised while opening regions are fatal; everything that
    /// happens inside a single poll or emission stays local to it.
    pub fn is_fatal(&self) -> bool {
        match self {
            TelemetryError::RegionAccess { .. } => true,
            TelemetryError::Layout { .. } => true,
            TelemetryError::UnsupportedPlatform { .. } => true,
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => true,
            _ => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::RegionAbsent { .. } => vec![
                "Start Assetto Corsa and load a session",
                "Wait for the simulator to finish loading the track",
            ],
            TelemetryError::RegionAccess { .. } => vec![
                "Run the relay under the same user as the simulator",
                "Check Windows permissions for shared memory access",
            ],
            TelemetryError::Layout { .. } => vec![
                "Verify the simulator version matches the compiled record layout",
                "Update the relay to a build that supports this simulator version",
            ],
            TelemetryError::Decode { .. } => vec![
                "Transient read failure, the next poll will retry",
                "Restart the simulator if the failure persists",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Check system load",
                "Increase read_timeout_ms in the configuration",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the configuration file is valid JSON",
                "Delete the file to regenerate defaults",
            ],
            TelemetryError::Serialization { .. } => vec![
                "Report the snapshot contents that failed to serialize",
            ],
            TelemetryError::Transport { .. } => vec![
                "Check the sink host and port in the configuration",
                "Verify the network route to the sink",
            ],
            TelemetryError::Task { .. } => vec![
                "Check the log for a panic in the named task",
            ],
            TelemetryError::UnsupportedPlatform { .. } => vec![
                "Run the relay on the Windows machine hosting the simulator",
            ],
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => vec![
                "Check Windows API permissions",
                "Verify system resources availability",
            ],
        }
    }

    /// Helper constructor for a region that does not exist yet.
    pub fn region_absent(region: RegionKind) -> Self {
        TelemetryError::RegionAbsent { region }
    }

    /// Helper constructor for region access failures.
    pub fn region_access(region: RegionKind, reason: impl Into<String>) -> Self {
        TelemetryError::RegionAccess { region, reason: reason.into(), source: None }
    }

    /// Helper constructor for region access failures with source.
    pub fn region_access_with_source(
        region: RegionKind,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::RegionAccess { region, reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for layout mismatches.
    pub fn layout_mismatch(region: RegionKind, expected: usize, found: usize) -> Self {
        TelemetryError::Layout { region, expected, found }
    }

    /// Helper constructor for decode failures.
    pub fn decode_error(region: RegionKind, details: impl Into<String>) -> Self {
        TelemetryError::Decode { region, details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        TelemetryError::Config { path: path.into(), details: details.into(), source: None }
    }

    /// Helper constructor for configuration errors with source.
    pub fn config_error_with_source(
        path: impl Into<PathBuf>,
        details: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Config { path: path.into(), details: details.into(), source: Some(source) }
    }

    /// Helper constructor for failed background tasks.
    pub fn task_failed(task: &'static str, details: impl std::fmt::Display) -> Self {
        TelemetryError::Task { task, details: details.to_string() }
    }

    /// Helper constructor for Windows API errors.
    #[cfg(windows)]
    pub fn windows_api_error(operation: impl Into<String>, source: core::Error) -> Self {
        TelemetryError::WindowsApi { operation: operation.into(), source }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        TelemetryError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}
