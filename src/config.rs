//! Relay configuration
//!
//! Loaded from a JSON file (default `config.json`). Every field has a default,
//! so a partial file is valid and an empty object yields the stock settings.
//!
//! ```json
//! {
//!   "sink": { "host": "127.0.0.1", "port": 10051 },
//!   "intervals": { "physics_ms": 250, "graphics_ms": 1000, "static_info_ms": 10000 },
//!   "retry_interval_ms": 2000,
//!   "emit_interval_ms": 1000,
//!   "read_timeout_ms": 250,
//!   "max_consecutive_poll_failures": 10,
//!   "teleport_threshold": 100.0,
//!   "min_rate_distance": 1.0,
//!   "fuel_assist_correction": 2.5
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::RegionKind;
use crate::{Result, TelemetryError};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub sink: SinkConfig,
    pub intervals: PollIntervals,
    /// Delay between connection attempts while the simulator is absent.
    pub retry_interval_ms: u64,
    /// Minimum spacing between two emitted snapshots.
    pub emit_interval_ms: u64,
    /// Upper bound on a single region read.
    pub read_timeout_ms: u64,
    /// Consecutive failed polls on one region before the connection is dropped.
    pub max_consecutive_poll_failures: u32,
    #[serde(flatten)]
    pub derivation: DerivationConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sink: SinkConfig::default(),
            intervals: PollIntervals::default(),
            retry_interval_ms: 2000,
            emit_interval_ms: 1000,
            read_timeout_ms: 250,
            max_consecutive_poll_failures: 10,
            derivation: DerivationConfig::default(),
        }
    }
}

/// Where snapshots are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 10051 }
    }
}

impl SinkConfig {
    /// `host:port` as passed to the socket layer.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Per-region polling periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollIntervals {
    pub physics_ms: u64,
    pub graphics_ms: u64,
    pub static_info_ms: u64,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self { physics_ms: 250, graphics_ms: 1000, static_info_ms: 10_000 }
    }
}

impl PollIntervals {
    pub fn period(&self, kind: RegionKind) -> Duration {
        let ms = match kind {
            RegionKind::Physics => self.physics_ms,
            RegionKind::Graphics => self.graphics_ms,
            RegionKind::StaticInfo => self.static_info_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Tuning of the derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Planar steps at or above this length are treated as teleports.
    pub teleport_threshold: f32,
    /// Distance below which no fuel rate is reported.
    pub min_rate_distance: f32,
    /// Multiplier applied to the fuel rate together with the fuel assist rate.
    pub fuel_assist_correction: f32,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self { teleport_threshold: 100.0, min_rate_distance: 1.0, fuel_assist_correction: 2.5 }
    }
}

impl RelayConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            TelemetryError::config_error_with_source(path, "failed to read file", Box::new(e))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            TelemetryError::config_error_with_source(path, "invalid JSON", Box::new(e))
        })?;
        config.validate().map_err(|details| TelemetryError::config_error(path, details))?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load a configuration file, creating it with defaults when missing.
    ///
    /// A file that cannot be read or parsed is reported and replaced by the
    /// defaults in memory; the file on disk is left untouched.
    pub fn load_or_init(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!(path = %path.display(), "Created default configuration"),
                Err(e) => warn!(path = %path.display(), error = %e, "Could not write default configuration"),
            }
            return config;
        }

        match Self::load(path) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    sink = %config.sink.target(),
                    "Configuration loaded"
                );
                config
            }
            Err(e) => {
                warn!(error = %e, "Falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            TelemetryError::config_error_with_source(path, "failed to write file", Box::new(e))
        })
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sink.host.trim().is_empty() {
            return Err("sink.host must not be empty".to_string());
        }
        if self.sink.port == 0 {
            return Err("sink.port must be non-zero".to_string());
        }

        let intervals = [
            ("intervals.physics_ms", self.intervals.physics_ms),
            ("intervals.graphics_ms", self.intervals.graphics_ms),
            ("intervals.static_info_ms", self.intervals.static_info_ms),
            ("retry_interval_ms", self.retry_interval_ms),
            ("emit_interval_ms", self.emit_interval_ms),
            ("read_timeout_ms", self.read_timeout_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(format!("{name} must be greater than zero"));
        }

        if self.max_consecutive_poll_failures == 0 {
            return Err("max_consecutive_poll_failures must be greater than zero".to_string());
        }
        if !(self.derivation.teleport_threshold > 0.0) {
            return Err("teleport_threshold must be positive".to_string());
        }
        Ok(())
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn emit_interval(&self) -> Duration {
        Duration::from_millis(self.emit_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
