//! Normalized telemetry snapshot sent to the sink
//!
//! The wire form is one flat JSON object. Session identity and metrics are
//! kept in separate structs for readability and flattened on serialization.
//! Consumers must tolerate additional fields appearing over time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One emitted telemetry record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Wall-clock time the snapshot was assembled (RFC 3339).
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub session: SessionFields,
    #[serde(flatten)]
    pub metrics: MetricFields,
}

impl TelemetrySnapshot {
    pub fn to_json_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Session identity, timing and standings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFields {
    pub session_id: i64,
    pub session_status: String,
    pub session_type: String,
    pub flag_type: String,
    pub short_comment: String,
    pub driver: String,
    pub car: String,
    pub track: String,
    pub completed_laps: i32,
    pub position: i32,
    /// Seconds.
    pub icurrent_time: f32,
    /// Seconds.
    pub session_time_left: f32,
    pub current_sector_index: i32,
    pub number_of_laps: i32,
    pub penalty_time: f32,
    /// Last lap, seconds.
    pub lap_time: f32,
    /// Seconds.
    pub best_lap_time: f32,
    pub track_spline_length: f32,
}

/// Physics, graphics, static and derived metrics.
///
/// Per-wheel fields use the `_fl`, `_fr`, `_rl`, `_rr` suffixes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricFields {
    // Derived
    /// Planar distance in world units since process start.
    pub distance_total: f32,
    pub fuel_used_total: f32,
    pub fuel_per_100km: f32,

    // Physics
    pub packet_id: i32,
    pub heading: f32,
    pub pit_limiter_on: i32,
    pub kers_charge: f32,
    pub kers_input: f32,
    pub turbo_boost: f32,
    pub ballast: f32,
    pub final_ff: f32,
    pub performance_meter: f32,
    pub engine_brake: i32,
    pub ers_recovery_level: i32,
    pub ers_power_level: i32,
    pub ers_heat_charging: i32,
    pub ers_is_charging: i32,
    pub kers_current_kj: f32,
    pub drs: f32,
    pub drs_available: bool,
    pub drs_enabled: bool,
    pub is_ai_controlled: i32,
    pub number_of_tyres_out: i32,
    pub gear: i32,
    pub fuel_level: f32,
    /// Percent.
    pub throttle_pos: f32,
    /// Percent.
    pub brake_pos: f32,
    /// Percent.
    pub clutch_pos: f32,
    pub engine_rpm: i32,
    pub speed: f32,
    pub road_temp: f32,
    pub air_temp: f32,
    pub air_density: f32,
    pub abs: f32,
    pub tc: f32,
    pub aid_auto_shift: bool,
    /// Percent to the front axle.
    pub brake_bias: f32,
    /// Millimeters.
    pub cg_height: f32,
    /// Average of the four brake discs.
    pub brake_temp: f32,
    /// Degrees.
    pub steering_angle: f32,
    pub tyre_temp_i: [f32; 4],
    pub local_velocity: [f32; 3],
    pub velocity: [f32; 3],
    pub tyre_dirty_level: [f32; 4],

    // Per wheel
    pub tyre_wear_fl: f32,
    pub tyre_wear_fr: f32,
    pub tyre_wear_rl: f32,
    pub tyre_wear_rr: f32,
    pub tire_temp_core_fl: f32,
    pub tire_temp_core_fr: f32,
    pub tire_temp_core_rl: f32,
    pub tire_temp_core_rr: f32,
    pub tire_pressure_fl: f32,
    pub tire_pressure_fr: f32,
    pub tire_pressure_rl: f32,
    pub tire_pressure_rr: f32,
    pub ride_height_fl: f32,
    pub ride_height_fr: f32,
    pub ride_height_rl: f32,
    pub ride_height_rr: f32,
    pub suspension_travel_fl: f32,
    pub suspension_travel_fr: f32,
    pub suspension_travel_rl: f32,
    pub suspension_travel_rr: f32,
    pub tire_radius_fl: f32,
    pub tire_radius_fr: f32,
    pub tire_radius_rl: f32,
    pub tire_radius_rr: f32,
    pub tire_load_fl: f32,
    pub tire_load_fr: f32,
    pub tire_load_rl: f32,
    pub tire_load_rr: f32,
    pub tire_temp_inner_fl: f32,
    pub tire_temp_inner_fr: f32,
    pub tire_temp_inner_rl: f32,
    pub tire_temp_inner_rr: f32,
    pub tire_temp_middle_fl: f32,
    pub tire_temp_middle_fr: f32,
    pub tire_temp_middle_rl: f32,
    pub tire_temp_middle_rr: f32,
    pub tire_temp_outer_fl: f32,
    pub tire_temp_outer_fr: f32,
    pub tire_temp_outer_rl: f32,
    pub tire_temp_outer_rr: f32,
    pub tire_slip_ratio_fl: f32,
    pub tire_slip_ratio_fr: f32,
    pub tire_slip_ratio_rl: f32,
    pub tire_slip_ratio_rr: f32,
    pub tire_slip_angle_fl: f32,
    pub tire_slip_angle_fr: f32,
    pub tire_slip_angle_rl: f32,
    pub tire_slip_angle_rr: f32,
    pub camber_fl: f32,
    pub camber_fr: f32,
    pub camber_rl: f32,
    pub camber_rr: f32,
    pub wheel_angular_speed_fl: f32,
    pub wheel_angular_speed_fr: f32,
    pub wheel_angular_speed_rl: f32,
    pub wheel_angular_speed_rr: f32,

    // Chassis
    pub cg_accel_longitudinal: f32,
    pub cg_accel_lateral: f32,
    pub cg_accel_vertical: f32,
    pub chassis_pitch_angle: f32,
    pub chassis_roll_angle: f32,
    pub chassis_yaw_rate: f32,
    pub chassis_pitch_rate: f32,
    pub chassis_roll_rate: f32,
    pub car_damage_front: f32,
    pub car_damage_rear: f32,
    pub car_damage_left: f32,
    pub car_damage_right: f32,

    // Graphics
    pub current_time: String,
    pub last_time: String,
    pub best_time: String,
    pub split: String,
    pub distance_traveled: f32,
    pub is_in_pit: i32,
    pub last_sector_time: i32,
    pub tyre_compound: String,
    pub replay_time_multiplier: f32,
    pub normalized_car_position: f32,
    pub car_coordinates: [f32; 3],
    pub ideal_line_on: i32,
    pub is_in_pit_lane: i32,
    pub surface_grip: f32,
    pub mandatory_pit_done: i32,
    pub wind_speed: f32,
    pub wind_direction: f32,

    // Static info
    pub ac_version: String,
    pub max_power: f32,
    pub max_torque: f32,
    pub max_rpm: i32,
    pub kers: i32,
    pub ers: i32,
}
