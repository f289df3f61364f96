//! Region traits for shared memory sources

use std::sync::Arc;

use crate::Result;
use crate::types::{RawSnapshot, RegionKind};

/// An open, readable region.
///
/// Implementations copy the record block out of the mapping on every read so
/// the returned snapshot never aliases memory the simulator is writing to.
pub trait Region: Send + Sync + 'static {
    /// Which region this handle refers to.
    fn kind(&self) -> RegionKind;

    /// Copy the current record block.
    ///
    /// This may block on a page fault or a kernel call. The pollers run it on
    /// the blocking pool under a timeout.
    fn read(&self) -> Result<RawSnapshot>;
}

/// Factory for region handles.
///
/// Returns:
/// - `Ok(region)` - region exists and is large enough for its record
/// - `Err(TelemetryError::RegionAbsent)` - simulator has not created it (yet)
/// - any other error - fatal, the region cannot be used as published
pub trait RegionProvider: Send + Sync + 'static {
    fn open(&self, kind: RegionKind) -> Result<Arc<dyn Region>>;
}
