//! Core types for simulator telemetry.
//!
//! - [`PhysicsRecord`], [`GraphicsRecord`] and [`StaticInfoRecord`] mirror the
//!   three shared memory structs byte for byte (see [`crate::decoder`])
//! - [`RegionKind`] and [`RawSnapshot`] identify where a block came from
//! - [`AcStatus`], [`SessionType`] and [`FlagType`] interpret the raw codes in
//!   the graphics record
//! - [`TelemetrySnapshot`] is the normalized output record

mod graphics;
mod physics;
mod region;
mod snapshot;
mod static_info;
mod status;

pub use graphics::GraphicsRecord;
pub use physics::PhysicsRecord;
pub use region::{ConnectionState, RawSnapshot, RegionKind};
pub use snapshot::{MetricFields, SessionFields, TelemetrySnapshot};
pub use static_info::StaticInfoRecord;
pub use status::{AcStatus, FlagType, SessionType};
