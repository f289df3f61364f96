//! Graphics record (`acpmf_graphics`)

use crate::decoder::{WideText, record};
use crate::types::{AcStatus, FlagType, RegionKind, SessionType};

record! {
    /// Session, timing and HUD state.
    pub struct GraphicsRecord: RegionKind::Graphics, 296 {
        pub packet_id: i32,
        pub status: i32,
        pub session: i32,
        pub current_time: WideText<15>,
        pub last_time: WideText<15>,
        pub best_time: WideText<15>,
        pub split: WideText<15>,
        pub completed_laps: i32,
        pub position: i32,
        /// Current lap time in milliseconds.
        pub i_current_time: i32,
        pub i_last_time: i32,
        pub i_best_time: i32,
        /// Milliseconds.
        pub session_time_left: f32,
        pub distance_traveled: f32,
        pub is_in_pit: i32,
        pub current_sector_index: i32,
        pub last_sector_time: i32,
        pub number_of_laps: i32,
        pub tyre_compound: WideText<33>,
        pub replay_time_multiplier: f32,
        pub normalized_car_position: f32,
        /// World position, `y` is up.
        pub car_coordinates: [f32; 3],
        pub penalty_time: f32,
        pub flag: i32,
        pub ideal_line_on: i32,
        pub is_in_pit_lane: i32,
        pub surface_grip: f32,
        pub mandatory_pit_done: i32,
        pub wind_speed: f32,
        pub wind_direction: f32,
    }
}

impl GraphicsRecord {
    pub fn game_status(&self) -> AcStatus {
        AcStatus::from_raw(self.status)
    }

    pub fn session_type(&self) -> SessionType {
        SessionType::from_raw(self.session)
    }

    pub fn flag_type(&self) -> FlagType {
        FlagType::from_raw(self.flag)
    }

    /// Planar position used for distance accumulation.
    pub fn planar_position(&self) -> (f32, f32) {
        (self.car_coordinates[0], self.car_coordinates[2])
    }
}
