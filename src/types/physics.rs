//! Physics record (`acpmf_physics`)

use crate::decoder::record;
use crate::types::RegionKind;

record! {
    /// Car physics, refreshed by the simulator every physics step.
    ///
    /// Per-wheel arrays are ordered front-left, front-right, rear-left,
    /// rear-right. Angles are radians, lengths meters.
    pub struct PhysicsRecord: RegionKind::Physics, 580 {
        pub packet_id: i32,
        pub gas: f32,
        pub brake: f32,
        pub fuel: f32,
        pub gear: i32,
        pub rpms: i32,
        pub steer_angle: f32,
        pub speed_kmh: f32,
        pub velocity: [f32; 3],
        pub acc_g: [f32; 3],
        pub wheel_slip: [f32; 4],
        pub wheel_load: [f32; 4],
        pub wheels_pressure: [f32; 4],
        pub wheel_angular_speed: [f32; 4],
        pub tyre_wear: [f32; 4],
        pub tyre_dirty_level: [f32; 4],
        pub tyre_core_temperature: [f32; 4],
        pub camber_rad: [f32; 4],
        pub suspension_travel: [f32; 4],
        pub drs: f32,
        pub tc: f32,
        pub heading: f32,
        pub pitch: f32,
        pub roll: f32,
        pub cg_height: f32,
        /// front, rear, left, right, centre
        pub car_damage: [f32; 5],
        pub number_of_tyres_out: i32,
        pub pit_limiter_on: i32,
        pub abs: f32,
        pub kers_charge: f32,
        pub kers_input: f32,
        pub auto_shifter_on: i32,
        /// front, rear
        pub ride_height: [f32; 2],
        pub turbo_boost: f32,
        pub ballast: f32,
        pub air_density: f32,
        pub air_temp: f32,
        pub road_temp: f32,
        pub local_angular_velocity: [f32; 3],
        pub final_ff: f32,
        pub performance_meter: f32,
        pub engine_brake: i32,
        pub ers_recovery_level: i32,
        pub ers_power_level: i32,
        pub ers_heat_charging: i32,
        pub ers_is_charging: i32,
        pub kers_current_kj: f32,
        pub drs_available: i32,
        pub drs_enabled: i32,
        pub brake_temp: [f32; 4],
        pub clutch: f32,
        pub tyre_temp_i: [f32; 4],
        pub tyre_temp_m: [f32; 4],
        pub tyre_temp_o: [f32; 4],
        pub is_ai_controlled: i32,
        pub tyre_contact_point: [[f32; 3]; 4],
        pub tyre_contact_normal: [[f32; 3]; 4],
        pub tyre_contact_heading: [[f32; 3]; 4],
        pub brake_bias: f32,
        pub local_velocity: [f32; 3],
    }
}
