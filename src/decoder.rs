//! Snapshot decoder for the simulator's fixed-layout records
//!
//! Each region holds one C struct compiled with 4-byte packing. Numeric fields
//! are little-endian `i32`/`f32`, text fields are NUL-padded UTF-16 buffers.
//! Records are declared once with [`record!`] which generates both the decoder
//! and the encoder from the same field list, so the two can never disagree.
//!
//! ```rust
//! use acrelay::decoder::{Record, decode};
//! use acrelay::{GraphicsRecord, RawSnapshot, RegionKind};
//!
//! let mut graphics = GraphicsRecord::default();
//! graphics.status = 2;
//! graphics.tyre_compound = "Soft".into();
//!
//! let raw = RawSnapshot::new(RegionKind::Graphics, graphics.encode());
//! let snapshot = decode(&raw).unwrap();
//! assert_eq!(snapshot.kind(), RegionKind::Graphics);
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{GraphicsRecord, PhysicsRecord, RawSnapshot, RegionKind, StaticInfoRecord};
use crate::{Result, TelemetryError};

/// Alignment of 32-bit fields under `#pragma pack(4)`.
const PACK: usize = 4;

/// Cursor over a raw record block.
pub struct LayoutReader<'a> {
    region: RegionKind,
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> LayoutReader<'a> {
    pub fn new(region: RegionKind, bytes: &'a [u8]) -> Self {
        Self { region, bytes, offset: 0 }
    }

    fn align(&mut self, to: usize) {
        self.offset = self.offset.next_multiple_of(to);
    }

    fn take<const W: usize>(&mut self) -> Result<[u8; W]> {
        let end = self.offset + W;
        let slice = self.bytes.get(self.offset..end).ok_or_else(|| {
            TelemetryError::decode_error(
                self.region,
                format!(
                    "Insufficient data at offset {} (need {} bytes, have {})",
                    self.offset,
                    W,
                    self.bytes.len().saturating_sub(self.offset)
                ),
            )
        })?;
        let mut out = [0u8; W];
        out.copy_from_slice(slice);
        self.offset = end;
        Ok(out)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.align(PACK);
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.align(PACK);
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.align(2);
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Applies trailing struct padding and checks the whole block was consumed.
    fn finish(mut self) -> Result<()> {
        self.align(PACK);
        if self.offset != self.bytes.len() {
            return Err(TelemetryError::decode_error(
                self.region,
                format!("Layout consumed {} of {} bytes", self.offset, self.bytes.len()),
            ));
        }
        Ok(())
    }
}

/// Byte builder producing blocks in the simulator's layout.
#[derive(Debug, Default)]
pub struct LayoutWriter {
    bytes: Vec<u8>,
}

impl LayoutWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(capacity) }
    }

    fn pad(&mut self, to: usize) {
        let aligned = self.bytes.len().next_multiple_of(to);
        self.bytes.resize(aligned, 0);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.pad(PACK);
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.pad(PACK);
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.pad(2);
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn finish(mut self) -> Vec<u8> {
        self.pad(PACK);
        self.bytes
    }
}

/// A value with a fixed position and width inside a record.
pub trait Field: Sized {
    fn read(reader: &mut LayoutReader<'_>) -> Result<Self>;
    fn write(&self, writer: &mut LayoutWriter);
}

impl Field for i32 {
    fn read(reader: &mut LayoutReader<'_>) -> Result<Self> {
        reader.read_i32()
    }

    fn write(&self, writer: &mut LayoutWriter) {
        writer.write_i32(*self);
    }
}

impl Field for f32 {
    fn read(reader: &mut LayoutReader<'_>) -> Result<Self> {
        reader.read_f32()
    }

    fn write(&self, writer: &mut LayoutWriter) {
        writer.write_f32(*self);
    }
}

impl<T, const N: usize> Field for [T; N]
where
    T: Field + Copy + Default,
{
    fn read(reader: &mut LayoutReader<'_>) -> Result<Self> {
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            *slot = T::read(reader)?;
        }
        Ok(out)
    }

    fn write(&self, writer: &mut LayoutWriter) {
        for value in self {
            value.write(writer);
        }
    }
}

/// A `wchar_t[N]` text buffer.
///
/// Decoding stops at the first NUL; invalid surrogates are replaced rather
/// than failing the whole record. Encoding truncates to `N` code units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WideText<const N: usize>(String);

impl<const N: usize> WideText<N> {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl<const N: usize> Deref for WideText<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> From<&str> for WideText<N> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<const N: usize> From<String> for WideText<N> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<const N: usize> fmt::Display for WideText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> Field for WideText<N> {
    fn read(reader: &mut LayoutReader<'_>) -> Result<Self> {
        let mut units = [0u16; N];
        for unit in units.iter_mut() {
            *unit = reader.read_u16()?;
        }
        let end = units.iter().position(|&u| u == 0).unwrap_or(N);
        Ok(Self(String::from_utf16_lossy(&units[..end])))
    }

    fn write(&self, writer: &mut LayoutWriter) {
        let mut written = 0;
        for unit in self.0.encode_utf16().take(N) {
            writer.write_u16(unit);
            written += 1;
        }
        for _ in written..N {
            writer.write_u16(0);
        }
    }
}

/// A fixed-layout record read from one region.
pub trait Record: Sized + Clone + Send + Sync + 'static {
    /// Region this record is published in.
    const KIND: RegionKind;
    /// Exact size of the record in bytes, trailing padding included.
    const SIZE: usize;

    fn read_fields(reader: &mut LayoutReader<'_>) -> Result<Self>;
    fn write_fields(&self, writer: &mut LayoutWriter);

    /// Decode a block that must be exactly [`Record::SIZE`] bytes long.
    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(TelemetryError::decode_error(
                Self::KIND,
                format!("Expected {} bytes, got {}", Self::SIZE, bytes.len()),
            ));
        }

        let mut reader = LayoutReader::new(Self::KIND, bytes);
        let record = Self::read_fields(&mut reader)?;
        reader.finish()?;
        Ok(record)
    }

    /// Encode into the simulator's layout.
    fn encode(&self) -> Vec<u8> {
        let mut writer = LayoutWriter::with_capacity(Self::SIZE);
        self.write_fields(&mut writer);
        writer.finish()
    }
}

/// Declares a record struct and its [`Record`] implementation from one field list.
macro_rules! record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $kind:expr, $size:literal {
            $(
                $(#[$fmeta:meta])*
                pub $field:ident: $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl $crate::decoder::Record for $name {
            const KIND: $crate::types::RegionKind = $kind;
            const SIZE: usize = $size;

            fn read_fields(
                reader: &mut $crate::decoder::LayoutReader<'_>,
            ) -> $crate::Result<Self> {
                Ok(Self {
                    $( $field: <$ty as $crate::decoder::Field>::read(reader)?, )*
                })
            }

            fn write_fields(&self, writer: &mut $crate::decoder::LayoutWriter) {
                $( $crate::decoder::Field::write(&self.$field, writer); )*
            }
        }
    };
}

pub(crate) use record;

/// A decoded record, shared by reference between the latest-value channels
/// and the pipeline.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Physics(Arc<PhysicsRecord>),
    Graphics(Arc<GraphicsRecord>),
    StaticInfo(Arc<StaticInfoRecord>),
}

impl Snapshot {
    pub fn kind(&self) -> RegionKind {
        match self {
            Snapshot::Physics(_) => RegionKind::Physics,
            Snapshot::Graphics(_) => RegionKind::Graphics,
            Snapshot::StaticInfo(_) => RegionKind::StaticInfo,
        }
    }
}

/// Size in bytes of the record stored in `kind`.
pub fn record_size(kind: RegionKind) -> usize {
    match kind {
        RegionKind::Physics => PhysicsRecord::SIZE,
        RegionKind::Graphics => GraphicsRecord::SIZE,
        RegionKind::StaticInfo => StaticInfoRecord::SIZE,
    }
}

/// Reinterpret a raw block as the record its region carries.
pub fn decode(raw: &RawSnapshot) -> Result<Snapshot> {
    let snapshot = match raw.kind {
        RegionKind::Physics => Snapshot::Physics(Arc::new(PhysicsRecord::decode(&raw.bytes)?)),
        RegionKind::Graphics => Snapshot::Graphics(Arc::new(GraphicsRecord::decode(&raw.bytes)?)),
        RegionKind::StaticInfo => {
            Snapshot::StaticInfo(Arc::new(StaticInfoRecord::decode(&raw.bytes)?))
        }
    };
    Ok(snapshot)
}
