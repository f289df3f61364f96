//! Assetto Corsa shared memory access
//!
//! The simulator publishes three named file mappings in the session
//! namespace (`Local\acpmf_physics`, `Local\acpmf_graphics`,
//! `Local\acpmf_static`). Each holds exactly one packed C struct that the
//! simulator rewrites in place. There is no header, version field or change
//! event, so readers poll and copy.
//!
//! # Usage
//!
//! ```rust,ignore
//! use acrelay::windows::SharedRegion;
//! use acrelay::provider::Region;
//! use acrelay::RegionKind;
//!
//! let region = SharedRegion::open(RegionKind::Physics)?;
//! let raw = region.read()?;
//! ```

mod region;

pub use region::SharedRegion;
