//! Telemetry relay for Assetto Corsa's shared memory interface.
//!
//! The simulator publishes three fixed-layout regions (physics, graphics and
//! static info). This crate maps them, polls each at its own rate, tracks
//! driving sessions from the game status, derives distance and fuel metrics,
//! and sends a flat JSON snapshot over UDP at a bounded rate.
//!
//! # Features
//!
//! - **Resilient connection**: waits for the simulator, reconnects after it exits
//! - **Strict decoding**: records are decoded field by field against their exact layout
//! - **Session tracking**: a fresh session id every time the game goes live
//! - **Derived metrics**: accumulated distance, fuel used and consumption rate
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acrelay::{Relay, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::load_or_init("config.json");
//!     let relay = Relay::connect_shared_memory(config).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     relay.stop();
//!     relay.join().await?;
//!     Ok(())
//! }
//! ```
//!
//! Shared memory is only available on Windows. Elsewhere the relay starts,
//! then stops with [`TelemetryError::UnsupportedPlatform`].

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding and derivation
pub mod decoder;
pub mod derivation;
pub mod session;

// Acquisition and delivery
mod acquisition;
pub mod config;
pub mod emitter;
mod pipeline;
pub mod provider;
pub mod providers;
mod relay;
pub mod transport;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

// Core exports
pub use error::*;
pub use types::*;

pub use acquisition::ConnectorSettings;
pub use config::{DerivationConfig, PollIntervals, RelayConfig, SinkConfig};
pub use decoder::{Record, Snapshot, WideText};
pub use derivation::{DerivationEngine, DerivationState};
pub use emitter::{EmitOutcome, Emitter};
pub use provider::{Region, RegionProvider};
pub use providers::SharedMemoryProvider;
pub use relay::{Relay, RelayHandle};
pub use session::{GameStatusChange, SessionState, SessionTracker};
pub use transport::{SnapshotSink, UdpSink};

#[cfg(windows)]
pub use crate::windows::SharedRegion;
