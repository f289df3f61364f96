//! Read-only mapping of one simulator region

use crate::decoder::record_size;
use crate::provider::Region;
use crate::types::{RawSnapshot, RegionKind};
use crate::{Result, TelemetryError};
use std::ptr::NonNull;
use tracing::{debug, trace};
use windows::Win32::Foundation::{
    CloseHandle, ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, HANDLE,
};
use windows::Win32::System::Memory::{
    FILE_MAP_READ, MEMORY_BASIC_INFORMATION, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile,
    OpenFileMappingW, UnmapViewOfFile, VirtualQuery,
};
use windows::core::PCWSTR;

/// Attempts at a torn-free copy before returning the last one.
const READ_ATTEMPTS: usize = 2;

/// An open view of `Local\acpmf_*`.
pub struct SharedRegion {
    kind: RegionKind,
    mapping: HANDLE,
    base: NonNull<u8>,
    size: usize,
}

impl SharedRegion {
    /// Open and map a region, checking it can hold the compiled record.
    pub fn open(kind: RegionKind) -> Result<Self> {
        trace!(region = %kind, "Opening shared memory region");

        let mapping = unsafe {
            let wide_name = wide_string(kind.mapping_name());
            OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR::from_raw(wide_name.as_ptr()))
                .map_err(|e| classify_open_error(kind, e))?
        };

        let base = unsafe {
            let view = MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, 0);
            match NonNull::new(view.Value as *mut u8) {
                Some(base) => base,
                None => {
                    let win_err = windows::core::Error::from_thread();
                    let _ = CloseHandle(mapping);
                    return Err(TelemetryError::windows_api_error("MapViewOfFile", win_err));
                }
            }
        };

        // From here Drop owns both the view and the handle.
        let size = record_size(kind);
        let region = Self { kind, mapping, base, size };

        let mapped = region.mapped_len()?;
        if mapped < size {
            return Err(TelemetryError::layout_mismatch(kind, size, mapped));
        }

        debug!(region = %kind, mapped, record_size = size, "Mapped shared memory region");
        Ok(region)
    }

    fn mapped_len(&self) -> Result<usize> {
        let mut info = MEMORY_BASIC_INFORMATION::default();
        let written = unsafe {
            VirtualQuery(
                Some(self.base.as_ptr() as *const _),
                &mut info,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 {
            let win_err = windows::core::Error::from_thread();
            return Err(TelemetryError::windows_api_error("VirtualQuery", win_err));
        }
        Ok(info.RegionSize)
    }

    fn leading_word(&self) -> [u8; 4] {
        let mut word = [0u8; 4];
        unsafe { std::ptr::copy_nonoverlapping(self.base.as_ptr(), word.as_mut_ptr(), 4) };
        word
    }
}

impl Region for SharedRegion {
    fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Copy the record, retrying once if the leading packet id moved mid-copy.
    fn read(&self) -> Result<RawSnapshot> {
        let mut bytes = vec![0u8; self.size];
        for attempt in 0..READ_ATTEMPTS {
            let before = self.leading_word();
            unsafe {
                std::ptr::copy_nonoverlapping(self.base.as_ptr(), bytes.as_mut_ptr(), self.size)
            };
            let after = self.leading_word();

            if before == after {
                break;
            }
            trace!(region = %self.kind, attempt = attempt + 1, "Record changed during copy");
        }
        Ok(RawSnapshot::new(self.kind, bytes))
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        unsafe {
            let addr = MEMORY_MAPPED_VIEW_ADDRESS { Value: self.base.as_ptr() as *mut _ };
            let _ = UnmapViewOfFile(addr);
            let _ = CloseHandle(self.mapping);
        }
        trace!(region = %self.kind, "Unmapped shared memory region");
    }
}

// SAFETY: the view is mapped read-only and only ever copied out of; the
// handle is a kernel object usable from any thread.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

fn classify_open_error(kind: RegionKind, error: windows::core::Error) -> TelemetryError {
    if error.code() == ERROR_FILE_NOT_FOUND.to_hresult() {
        TelemetryError::region_absent(kind)
    } else if error.code() == ERROR_ACCESS_DENIED.to_hresult() {
        TelemetryError::region_access_with_source(kind, "access denied", Box::new(error))
    } else {
        TelemetryError::windows_api_error("OpenFileMappingW", error)
    }
}

/// Convert string to null-terminated wide string for Windows APIs
fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}
