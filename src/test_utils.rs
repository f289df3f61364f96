//! Test doubles for regions and sinks, plus sample records
//!
//! [`ScriptedProvider`] stands in for the simulator: tests decide which
//! regions exist, what they contain, and when reads fail.
//! [`RecordingSink`] captures every payload the emitter delivers.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::decoder::{Record, record_size};
use crate::provider::{Region, RegionProvider};
use crate::transport::SnapshotSink;
use crate::types::{
    GraphicsRecord, PhysicsRecord, RawSnapshot, RegionKind, StaticInfoRecord, TelemetrySnapshot,
};
use crate::{Result, TelemetryError};

/// How a scripted region responds to `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Absent,
    Present,
    /// Exists but cannot be mapped.
    Denied,
    /// Exists but is smaller than its record.
    TooSmall,
}

#[derive(Debug)]
struct ScriptedRegionState {
    availability: Availability,
    bytes: Vec<u8>,
    fail_reads: bool,
    stall: Option<Duration>,
    open_attempts: usize,
    reads: usize,
}

impl ScriptedRegionState {
    fn new(kind: RegionKind, availability: Availability) -> Self {
        Self {
            availability,
            bytes: vec![0; record_size(kind)],
            fail_reads: false,
            stall: None,
            open_attempts: 0,
            reads: 0,
        }
    }
}

/// Region provider driven entirely by the test.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    regions: Arc<Mutex<HashMap<RegionKind, ScriptedRegionState>>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    /// Simulator not running: every region is absent.
    pub fn new() -> Self {
        Self::with_availability(Availability::Absent)
    }

    /// Simulator running with zeroed records in every region.
    pub fn running() -> Self {
        Self::with_availability(Availability::Present)
    }

    fn with_availability(availability: Availability) -> Self {
        let regions = RegionKind::ALL
            .iter()
            .map(|&kind| (kind, ScriptedRegionState::new(kind, availability)))
            .collect();
        Self { regions: Arc::new(Mutex::new(regions)) }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RegionKind, ScriptedRegionState>> {
        self.regions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_region<T>(&self, kind: RegionKind, f: impl FnOnce(&mut ScriptedRegionState) -> T) -> T {
        let mut regions = self.lock();
        let state = regions
            .entry(kind)
            .or_insert_with(|| ScriptedRegionState::new(kind, Availability::Absent));
        f(state)
    }

    pub fn set_availability(&self, kind: RegionKind, availability: Availability) {
        self.with_region(kind, |state| state.availability = availability);
    }

    /// Make every region present or absent at once.
    pub fn set_running(&self, running: bool) {
        let availability = if running { Availability::Present } else { Availability::Absent };
        for kind in RegionKind::ALL {
            self.set_availability(kind, availability);
        }
    }

    /// Replace the contents of the record's region.
    pub fn publish<R: Record>(&self, record: &R) {
        let bytes = record.encode();
        self.with_region(R::KIND, |state| state.bytes = bytes);
    }

    /// Make reads of `kind` fail with a decode error until switched off.
    pub fn fail_reads(&self, kind: RegionKind, fail: bool) {
        self.with_region(kind, |state| state.fail_reads = fail);
    }

    /// Block every read of `kind` for `stall` before it returns, as a hung
    /// mapping would. `None` restores immediate reads.
    pub fn stall_reads(&self, kind: RegionKind, stall: Option<Duration>) {
        self.with_region(kind, |state| state.stall = stall);
    }

    pub fn open_attempts(&self, kind: RegionKind) -> usize {
        self.with_region(kind, |state| state.open_attempts)
    }

    pub fn reads(&self, kind: RegionKind) -> usize {
        self.with_region(kind, |state| state.reads)
    }
}

impl RegionProvider for ScriptedProvider {
    fn open(&self, kind: RegionKind) -> Result<Arc<dyn Region>> {
        let availability = self.with_region(kind, |state| {
            state.open_attempts += 1;
            state.availability
        });

        match availability {
            Availability::Absent => Err(TelemetryError::region_absent(kind)),
            Availability::Denied => Err(TelemetryError::region_access(kind, "access denied")),
            Availability::TooSmall => {
                Err(TelemetryError::layout_mismatch(kind, record_size(kind), 16))
            }
            Availability::Present => Ok(Arc::new(ScriptedRegion { kind, provider: self.clone() })),
        }
    }
}

/// Open handle onto a scripted region.
#[derive(Debug)]
pub struct ScriptedRegion {
    kind: RegionKind,
    provider: ScriptedProvider,
}

impl Region for ScriptedRegion {
    fn kind(&self) -> RegionKind {
        self.kind
    }

    fn read(&self) -> Result<RawSnapshot> {
        let stall = self.provider.with_region(self.kind, |state| {
            state.reads += 1;
            state.stall
        });
        if let Some(stall) = stall {
            std::thread::sleep(stall);
        }

        self.provider.with_region(self.kind, |state| {
            if state.fail_reads {
                return Err(TelemetryError::decode_error(self.kind, "scripted read failure"));
            }
            Ok(RawSnapshot::new(self.kind, state.bytes.clone()))
        })
    }
}

/// Sink that keeps every payload in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    payloads: Mutex<Vec<Vec<u8>>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingSink {
    /// A sink whose every send fails, as if the destination were unreachable.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Delivered payloads parsed back into snapshots.
    pub fn snapshots(&self) -> Vec<TelemetrySnapshot> {
        self.payloads()
            .iter()
            .filter_map(|payload| serde_json::from_slice(payload).ok())
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SnapshotSink for RecordingSink {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TelemetryError::Transport {
                target: self.target(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        self.payloads.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(payload.to_vec());
        Ok(())
    }

    fn target(&self) -> String {
        "recording".to_string()
    }
}

/// Physics of a car rolling down the straight in fourth gear.
pub fn sample_physics() -> PhysicsRecord {
    PhysicsRecord {
        packet_id: 1200,
        gas: 0.8,
        brake: 0.0,
        fuel: 42.5,
        gear: 5,
        rpms: 7400,
        steer_angle: 0.05,
        speed_kmh: 212.0,
        velocity: [58.0, 0.1, 2.0],
        acc_g: [0.02, 0.0, 0.3],
        wheel_slip: [0.01, 0.01, 0.03, 0.03],
        wheel_load: [3100.0, 3050.0, 3600.0, 3580.0],
        wheels_pressure: [27.5, 27.4, 26.9, 27.0],
        tyre_core_temperature: [82.0, 81.5, 86.0, 85.0],
        suspension_travel: [0.031, 0.030, 0.042, 0.041],
        cg_height: 0.32,
        ride_height: [0.052, 0.071],
        air_temp: 24.0,
        road_temp: 31.0,
        brake_bias: 0.56,
        brake_temp: [350.0, 352.0, 240.0, 238.0],
        ..PhysicsRecord::default()
    }
}

/// Graphics of a live practice session.
pub fn sample_graphics() -> GraphicsRecord {
    GraphicsRecord {
        packet_id: 310,
        status: 2,
        session: 0,
        current_time: "1:12.345".into(),
        last_time: "1:48.901".into(),
        best_time: "1:47.220".into(),
        completed_laps: 3,
        position: 1,
        i_current_time: 72_345,
        i_last_time: 108_901,
        i_best_time: 107_220,
        current_sector_index: 1,
        number_of_laps: 0,
        tyre_compound: "Semislick".into(),
        normalized_car_position: 0.41,
        car_coordinates: [120.0, 4.0, -310.0],
        flag: 0,
        surface_grip: 0.98,
        wind_speed: 3.0,
        wind_direction: 270.0,
        ..GraphicsRecord::default()
    }
}

/// Static info for a car at Monza with realistic fuel usage.
pub fn sample_static_info() -> StaticInfoRecord {
    StaticInfoRecord {
        sm_version: "1.7".into(),
        ac_version: "1.16".into(),
        number_of_sessions: 1,
        num_cars: 1,
        car_model: "ks_ferrari_488_gt3".into(),
        track: "monza".into(),
        player_name: "Alex".into(),
        player_surname: "Driver".into(),
        player_nick: "ADR".into(),
        sector_count: 3,
        max_torque: 600.0,
        max_power: 441_000.0,
        max_rpm: 7800,
        max_fuel: 120.0,
        tyre_radius: [0.34, 0.34, 0.35, 0.35],
        aid_fuel_rate: 1.0,
        aid_tire_rate: 1.0,
        track_spline_length: 5793.0,
        ..StaticInfoRecord::default()
    }
}

/// Let spawned tasks run until they block again.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
