//! Static info record (`acpmf_static`)

use crate::decoder::{WideText, record};
use crate::types::RegionKind;

record! {
    /// Car, track and assist settings that stay constant for a session.
    pub struct StaticInfoRecord: RegionKind::StaticInfo, 684 {
        pub sm_version: WideText<15>,
        pub ac_version: WideText<15>,
        pub number_of_sessions: i32,
        pub num_cars: i32,
        pub car_model: WideText<33>,
        pub track: WideText<33>,
        pub player_name: WideText<33>,
        pub player_surname: WideText<33>,
        pub player_nick: WideText<33>,
        pub sector_count: i32,
        pub max_torque: f32,
        pub max_power: f32,
        pub max_rpm: i32,
        pub max_fuel: f32,
        pub suspension_max_travel: [f32; 4],
        pub tyre_radius: [f32; 4],
        pub max_turbo_boost: f32,
        pub air_temp: f32,
        pub road_temp: f32,
        pub penalties_enabled: i32,
        pub aid_fuel_rate: f32,
        pub aid_tire_rate: f32,
        pub aid_mechanical_damage: f32,
        pub aid_allow_tyre_blankets: i32,
        pub aid_stability: f32,
        pub aid_auto_clutch: i32,
        pub aid_auto_blip: i32,
        pub has_drs: i32,
        pub has_ers: i32,
        pub has_kers: i32,
        pub kers_max_j: f32,
        pub engine_brake_settings_count: i32,
        pub ers_power_controller_count: i32,
        pub track_spline_length: f32,
        pub track_configuration: WideText<33>,
        pub ers_max_j: f32,
        pub is_timed_race: i32,
        pub has_extra_lap: i32,
        pub car_skin: WideText<33>,
        pub reversed_grid_positions: i32,
        pub pit_window_start: i32,
        pub pit_window_end: i32,
    }
}
