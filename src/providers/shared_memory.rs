//! Shared memory provider for the running simulator

use std::sync::Arc;

use crate::Result;
use crate::provider::{Region, RegionProvider};
use crate::types::RegionKind;

/// Opens the simulator's `Local\acpmf_*` mappings.
///
/// Only Windows hosts the simulator; on other platforms every open fails with
/// an unsupported-platform error, which the connector treats as fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedMemoryProvider;

impl SharedMemoryProvider {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
impl RegionProvider for SharedMemoryProvider {
    fn open(&self, kind: RegionKind) -> Result<Arc<dyn Region>> {
        let region = crate::windows::SharedRegion::open(kind)?;
        Ok(Arc::new(region))
    }
}

#[cfg(not(windows))]
impl RegionProvider for SharedMemoryProvider {
    fn open(&self, _kind: RegionKind) -> Result<Arc<dyn Region>> {
        Err(crate::TelemetryError::unsupported_platform("Shared memory telemetry", "Windows"))
    }
}
