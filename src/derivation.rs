//! Derived metrics and snapshot assembly
//!
//! The engine keeps a few accumulators across ticks (last planar position,
//! cumulative distance, fuel baseline) and turns the latest records into one
//! normalized [`TelemetrySnapshot`]. Missing graphics or static info never
//! fails a derivation; the affected fields are left at zero or empty.
//!
//! Unit conventions of the output:
//! - angles in degrees, angular rates in degrees per second
//! - lap and session times in seconds
//! - ride height, suspension travel, tyre radius and CG height in millimeters
//! - pedal positions, slip ratio and brake bias in percent

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::config::DerivationConfig;
use crate::session::SessionState;
use crate::types::{
    GraphicsRecord, MetricFields, PhysicsRecord, SessionFields, StaticInfoRecord,
    TelemetrySnapshot,
};

const METERS_TO_MM: f32 = 1000.0;
const FRACTION_TO_PERCENT: f32 = 100.0;
const MS_TO_S: f32 = 1000.0;

/// Accumulators carried between derivations.
///
/// Lives for the whole process. Reconnecting to the simulator does not reset
/// it; only a new session re-latches the fuel baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivationState {
    pub last_position: Option<(f32, f32)>,
    pub total_distance: f32,
    pub fuel_at_session_start: Option<f32>,
    /// Session the fuel baseline belongs to.
    pub fuel_session: Option<i64>,
    pub last_fuel_used: f32,
}

/// Inputs of one derivation.
#[derive(Debug, Clone, Copy)]
pub struct DerivationInput<'a> {
    pub physics: &'a PhysicsRecord,
    pub graphics: Option<&'a GraphicsRecord>,
    pub static_info: Option<&'a StaticInfoRecord>,
    pub session: SessionState,
    pub timestamp: DateTime<Utc>,
}

/// Pure derivation step: returns the next state and the assembled snapshot.
pub fn derive(
    config: &DerivationConfig,
    state: &DerivationState,
    input: DerivationInput<'_>,
) -> (DerivationState, TelemetrySnapshot) {
    let mut next = state.clone();

    if let Some(graphics) = input.graphics {
        next.advance_position(graphics.planar_position(), config.teleport_threshold);
    }
    let fuel_used = next.fuel_used(input.physics.fuel, input.session.session_id);

    let aid_fuel_rate = input.static_info.map_or(1.0, |info| info.aid_fuel_rate);
    let fuel_per_100km = fuel_rate(
        fuel_used,
        next.total_distance,
        config.min_rate_distance,
        config.fuel_assist_correction * aid_fuel_rate,
    );

    let snapshot = TelemetrySnapshot {
        timestamp: input.timestamp,
        session: session_fields(&input),
        metrics: MetricFields {
            distance_total: next.total_distance,
            fuel_used_total: fuel_used,
            fuel_per_100km,
            ..metric_fields(input.physics, input.graphics, input.static_info)
        },
    };

    (next, snapshot)
}

impl DerivationState {
    /// Add the planar step from the last known position.
    ///
    /// The first position is recorded without adding distance. A step at or
    /// above `teleport_threshold` (pit teleport, session restart) adds nothing
    /// but still moves the reference point.
    pub fn advance_position(&mut self, position: (f32, f32), teleport_threshold: f32) {
        if let Some((last_x, last_z)) = self.last_position {
            let step = (position.0 - last_x).hypot(position.1 - last_z);
            if step < teleport_threshold {
                self.total_distance += step;
            } else {
                trace!(step, "Discarding teleport step");
            }
        }
        self.last_position = Some(position);
    }

    /// Fuel consumed since the baseline, never decreasing within a session.
    ///
    /// A new session drops the old baseline. The first positive fuel level
    /// then latches a new one. When fuel rises (refuel) the baseline is moved
    /// up by the same amount so the reported figure holds steady.
    pub fn fuel_used(&mut self, fuel: f32, session_id: Option<i64>) -> f32 {
        if self.fuel_session != session_id {
            self.fuel_session = session_id;
            self.fuel_at_session_start = None;
            self.last_fuel_used = 0.0;
        }

        if self.fuel_at_session_start.is_none() && fuel > 0.0 {
            self.fuel_at_session_start = Some(fuel);
        }

        let Some(baseline) = self.fuel_at_session_start else {
            return 0.0;
        };

        let mut used = (baseline - fuel).max(0.0);
        if used < self.last_fuel_used {
            self.fuel_at_session_start = Some(fuel + self.last_fuel_used);
            used = self.last_fuel_used;
        }
        self.last_fuel_used = used;
        used
    }
}

/// Stateful wrapper owning the accumulators.
#[derive(Debug, Clone, Default)]
pub struct DerivationEngine {
    config: DerivationConfig,
    state: DerivationState,
}

impl DerivationEngine {
    pub fn new(config: DerivationConfig) -> Self {
        Self { config, state: DerivationState::default() }
    }

    pub fn state(&self) -> &DerivationState {
        &self.state
    }

    pub fn derive(&mut self, input: DerivationInput<'_>) -> TelemetrySnapshot {
        let (next, snapshot) = derive(&self.config, &self.state, input);
        self.state = next;
        snapshot
    }
}

/// Fuel per 100 km, zero until there is distance and consumption to divide.
fn fuel_rate(fuel_used: f32, distance: f32, min_distance: f32, correction: f32) -> f32 {
    if distance > min_distance && fuel_used > 0.0 {
        fuel_used * 100_000.0 / distance / 1000.0 * correction
    } else {
        0.0
    }
}

/// Bounds-checked wheel accessor.
fn wheel(values: &[f32], index: usize) -> f32 {
    values.get(index).copied().unwrap_or(0.0)
}

fn wheels(values: &[f32]) -> [f32; 4] {
    [wheel(values, 0), wheel(values, 1), wheel(values, 2), wheel(values, 3)]
}

fn wheels_scaled(values: &[f32], factor: f32) -> [f32; 4] {
    wheels(values).map(|v| v * factor)
}

fn wheels_degrees(values: &[f32]) -> [f32; 4] {
    wheels(values).map(f32::to_degrees)
}

fn average(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn session_fields(input: &DerivationInput<'_>) -> SessionFields {
    let graphics = input.graphics;
    let info = input.static_info;
    let completed_laps = graphics.map_or(0, |g| g.completed_laps);

    SessionFields {
        session_id: input.session.session_id.unwrap_or_default(),
        session_status: input.session.game_status.label().to_string(),
        session_type: graphics.map(|g| g.session_type()).unwrap_or_default().label().to_string(),
        flag_type: graphics.map(|g| g.flag_type()).unwrap_or_default().label().to_string(),
        short_comment: format!("Tires Aid: {} (SM)", info.map_or(0.0, |i| i.aid_tire_rate)),
        driver: info.map(|i| i.player_name.to_string()).unwrap_or_default(),
        car: info.map(|i| i.car_model.to_string()).unwrap_or_default(),
        track: info.map(|i| i.track.to_string()).unwrap_or_default(),
        completed_laps,
        position: graphics.map_or(0, |g| g.position),
        icurrent_time: graphics.map_or(0.0, |g| g.i_current_time as f32 / MS_TO_S),
        session_time_left: graphics.map_or(0.0, |g| g.session_time_left / MS_TO_S),
        current_sector_index: graphics.map_or(0, |g| g.current_sector_index.clamp(0, 2)),
        number_of_laps: completed_laps + 1,
        penalty_time: graphics.map_or(0.0, |g| g.penalty_time),
        lap_time: graphics.map_or(0.0, |g| g.i_last_time as f32 / MS_TO_S),
        best_lap_time: graphics.map_or(0.0, |g| g.i_best_time as f32 / MS_TO_S),
        track_spline_length: info.map_or(0.0, |i| i.track_spline_length),
    }
}

fn metric_fields(
    p: &PhysicsRecord,
    graphics: Option<&GraphicsRecord>,
    info: Option<&StaticInfoRecord>,
) -> MetricFields {
    let [tyre_wear_fl, tyre_wear_fr, tyre_wear_rl, tyre_wear_rr] = wheels(&p.tyre_wear);
    let [tire_temp_core_fl, tire_temp_core_fr, tire_temp_core_rl, tire_temp_core_rr] =
        wheels(&p.tyre_core_temperature);
    let [tire_pressure_fl, tire_pressure_fr, tire_pressure_rl, tire_pressure_rr] =
        wheels(&p.wheels_pressure);
    let [ride_height_fl, ride_height_fr, ride_height_rl, ride_height_rr] =
        wheels_scaled(&p.ride_height, METERS_TO_MM);
    let [suspension_travel_fl, suspension_travel_fr, suspension_travel_rl, suspension_travel_rr] =
        wheels_scaled(&p.suspension_travel, METERS_TO_MM);
    let [tire_radius_fl, tire_radius_fr, tire_radius_rl, tire_radius_rr] =
        info.map_or([0.0; 4], |i| wheels_scaled(&i.tyre_radius, METERS_TO_MM));
    let [tire_load_fl, tire_load_fr, tire_load_rl, tire_load_rr] = wheels(&p.wheel_load);
    let [tire_temp_inner_fl, tire_temp_inner_fr, tire_temp_inner_rl, tire_temp_inner_rr] =
        wheels(&p.tyre_temp_i);
    let [tire_temp_middle_fl, tire_temp_middle_fr, tire_temp_middle_rl, tire_temp_middle_rr] =
        wheels(&p.tyre_temp_m);
    let [tire_temp_outer_fl, tire_temp_outer_fr, tire_temp_outer_rl, tire_temp_outer_rr] =
        wheels(&p.tyre_temp_o);
    let [tire_slip_ratio_fl, tire_slip_ratio_fr, tire_slip_ratio_rl, tire_slip_ratio_rr] =
        wheels_scaled(&p.wheel_slip, FRACTION_TO_PERCENT);
    let [camber_fl, camber_fr, camber_rl, camber_rr] = wheels_degrees(&p.camber_rad);
    let [
        wheel_angular_speed_fl,
        wheel_angular_speed_fr,
        wheel_angular_speed_rl,
        wheel_angular_speed_rr,
    ] = wheels(&p.wheel_angular_speed);

    // The physics record carries no per-wheel slip angle; steering angle stands in.
    let steering_angle = p.steer_angle.to_degrees();

    let g = graphics.cloned().unwrap_or_default();

    MetricFields {
        packet_id: p.packet_id,
        heading: p.heading,
        pit_limiter_on: p.pit_limiter_on,
        kers_charge: p.kers_charge,
        kers_input: p.kers_input,
        turbo_boost: p.turbo_boost,
        ballast: p.ballast,
        final_ff: p.final_ff,
        performance_meter: p.performance_meter,
        engine_brake: p.engine_brake,
        ers_recovery_level: p.ers_recovery_level,
        ers_power_level: p.ers_power_level,
        ers_heat_charging: p.ers_heat_charging,
        ers_is_charging: p.ers_is_charging,
        kers_current_kj: p.kers_current_kj,
        drs: p.drs,
        drs_available: p.drs_available > 0,
        drs_enabled: p.drs_enabled > 0,
        is_ai_controlled: p.is_ai_controlled,
        number_of_tyres_out: p.number_of_tyres_out,
        gear: p.gear,
        fuel_level: p.fuel,
        throttle_pos: p.gas * FRACTION_TO_PERCENT,
        brake_pos: p.brake * FRACTION_TO_PERCENT,
        clutch_pos: p.clutch * FRACTION_TO_PERCENT,
        engine_rpm: p.rpms,
        speed: p.speed_kmh,
        road_temp: p.road_temp,
        air_temp: p.air_temp,
        air_density: p.air_density,
        abs: p.abs,
        tc: p.tc,
        aid_auto_shift: p.auto_shifter_on > 0,
        brake_bias: p.brake_bias * FRACTION_TO_PERCENT,
        cg_height: p.cg_height * METERS_TO_MM,
        brake_temp: average(&p.brake_temp),
        steering_angle,
        tyre_temp_i: p.tyre_temp_i,
        local_velocity: p.local_velocity,
        velocity: p.velocity,
        tyre_dirty_level: p.tyre_dirty_level,

        tyre_wear_fl,
        tyre_wear_fr,
        tyre_wear_rl,
        tyre_wear_rr,
        tire_temp_core_fl,
        tire_temp_core_fr,
        tire_temp_core_rl,
        tire_temp_core_rr,
        tire_pressure_fl,
        tire_pressure_fr,
        tire_pressure_rl,
        tire_pressure_rr,
        ride_height_fl,
        ride_height_fr,
        ride_height_rl,
        ride_height_rr,
        suspension_travel_fl,
        suspension_travel_fr,
        suspension_travel_rl,
        suspension_travel_rr,
        tire_radius_fl,
        tire_radius_fr,
        tire_radius_rl,
        tire_radius_rr,
        tire_load_fl,
        tire_load_fr,
        tire_load_rl,
        tire_load_rr,
        tire_temp_inner_fl,
        tire_temp_inner_fr,
        tire_temp_inner_rl,
        tire_temp_inner_rr,
        tire_temp_middle_fl,
        tire_temp_middle_fr,
        tire_temp_middle_rl,
        tire_temp_middle_rr,
        tire_temp_outer_fl,
        tire_temp_outer_fr,
        tire_temp_outer_rl,
        tire_temp_outer_rr,
        tire_slip_ratio_fl,
        tire_slip_ratio_fr,
        tire_slip_ratio_rl,
        tire_slip_ratio_rr,
        tire_slip_angle_fl: steering_angle,
        tire_slip_angle_fr: steering_angle,
        tire_slip_angle_rl: steering_angle,
        tire_slip_angle_rr: steering_angle,
        camber_fl,
        camber_fr,
        camber_rl,
        camber_rr,
        wheel_angular_speed_fl,
        wheel_angular_speed_fr,
        wheel_angular_speed_rl,
        wheel_angular_speed_rr,

        cg_accel_longitudinal: wheel(&p.acc_g, 0),
        cg_accel_lateral: wheel(&p.acc_g, 1),
        cg_accel_vertical: wheel(&p.acc_g, 2),
        chassis_pitch_angle: p.pitch.to_degrees(),
        chassis_roll_angle: p.roll.to_degrees(),
        chassis_yaw_rate: wheel(&p.local_angular_velocity, 1).to_degrees(),
        chassis_pitch_rate: wheel(&p.local_angular_velocity, 0).to_degrees(),
        chassis_roll_rate: wheel(&p.local_angular_velocity, 2).to_degrees(),
        car_damage_front: wheel(&p.car_damage, 0),
        car_damage_rear: wheel(&p.car_damage, 1),
        car_damage_left: wheel(&p.car_damage, 2),
        car_damage_right: wheel(&p.car_damage, 3),

        current_time: g.current_time.into_string(),
        last_time: g.last_time.into_string(),
        best_time: g.best_time.into_string(),
        split: g.split.into_string(),
        distance_traveled: g.distance_traveled,
        is_in_pit: g.is_in_pit,
        last_sector_time: g.last_sector_time,
        tyre_compound: g.tyre_compound.into_string(),
        replay_time_multiplier: g.replay_time_multiplier,
        normalized_car_position: g.normalized_car_position,
        car_coordinates: g.car_coordinates,
        ideal_line_on: g.ideal_line_on,
        is_in_pit_lane: g.is_in_pit_lane,
        surface_grip: g.surface_grip,
        mandatory_pit_done: g.mandatory_pit_done,
        wind_speed: g.wind_speed,
        wind_direction: g.wind_direction,

        ac_version: info.map(|i| i.ac_version.to_string()).unwrap_or_default(),
        max_power: info.map_or(0.0, |i| i.max_power),
        max_torque: info.map_or(0.0, |i| i.max_torque),
        max_rpm: info.map_or(0, |i| i.max_rpm),
        kers: info.map_or(0, |i| i.has_kers),
        ers: info.map_or(0, |i| i.has_ers),

        ..MetricFields::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AcStatus;
    use proptest::prelude::*;

    fn live_session(id: i64) -> SessionState {
        SessionState { active: true, session_id: Some(id), game_status: AcStatus::Live }
    }

    fn graphics_at(x: f32, z: f32) -> GraphicsRecord {
        GraphicsRecord { car_coordinates: [x, 1.5, z], ..Default::default() }
    }

    fn input<'a>(
        physics: &'a PhysicsRecord,
        graphics: Option<&'a GraphicsRecord>,
        static_info: Option<&'a StaticInfoRecord>,
        session: SessionState,
    ) -> DerivationInput<'a> {
        DerivationInput { physics, graphics, static_info, session, timestamp: Utc::now() }
    }

    #[test]
    fn distance_skips_teleports_but_moves_reference() {
        let mut state = DerivationState::default();
        state.advance_position((0.0, 0.0), 100.0);
        state.advance_position((3.0, 4.0), 100.0);
        state.advance_position((153.0, 4.0), 100.0);

        assert_eq!(state.total_distance, 5.0);
        assert_eq!(state.last_position, Some((153.0, 4.0)));

        state.advance_position((156.0, 8.0), 100.0);
        assert_eq!(state.total_distance, 10.0);
    }

    #[test]
    fn step_equal_to_threshold_is_a_teleport() {
        let mut state = DerivationState::default();
        state.advance_position((0.0, 0.0), 100.0);
        state.advance_position((100.0, 0.0), 100.0);
        assert_eq!(state.total_distance, 0.0);
    }

    #[test]
    fn fuel_rate_matches_reference_figures() {
        let config = DerivationConfig::default();
        let mut state = DerivationState {
            total_distance: 2000.0,
            last_position: Some((0.0, 0.0)),
            ..Default::default()
        };
        state.fuel_used(50.0, Some(1));

        let physics = PhysicsRecord { fuel: 47.5, ..Default::default() };
        let graphics = graphics_at(0.0, 0.0);
        let info = StaticInfoRecord { aid_fuel_rate: 1.0, ..Default::default() };

        let (next, snapshot) =
            derive(&config, &state, input(&physics, Some(&graphics), Some(&info), live_session(1)));

        assert_eq!(next.total_distance, 2000.0);
        assert_eq!(snapshot.metrics.fuel_used_total, 2.5);
        assert!((snapshot.metrics.fuel_per_100km - 0.3125).abs() < 1e-6);
    }

    #[test]
    fn fuel_rate_is_zero_without_distance_or_consumption() {
        assert_eq!(fuel_rate(2.5, 1.0, 1.0, 2.5), 0.0);
        assert_eq!(fuel_rate(0.0, 5000.0, 1.0, 2.5), 0.0);
        assert!(fuel_rate(1.0, 1.5, 1.0, 2.5) > 0.0);
    }

    #[test]
    fn fuel_baseline_latches_on_first_positive_level() {
        let mut state = DerivationState::default();
        assert_eq!(state.fuel_used(0.0, Some(1)), 0.0);
        assert_eq!(state.fuel_at_session_start, None);

        assert_eq!(state.fuel_used(40.0, Some(1)), 0.0);
        assert_eq!(state.fuel_used(38.0, Some(1)), 2.0);
    }

    #[test]
    fn refuel_keeps_reported_usage() {
        let mut state = DerivationState::default();
        state.fuel_used(50.0, Some(1));
        assert_eq!(state.fuel_used(45.0, Some(1)), 5.0);

        assert_eq!(state.fuel_used(60.0, Some(1)), 5.0);
        assert_eq!(state.fuel_at_session_start, Some(65.0));
        assert_eq!(state.fuel_used(59.0, Some(1)), 6.0);
    }

    #[test]
    fn new_session_relatches_fuel_but_keeps_distance() {
        let mut state = DerivationState::default();
        state.advance_position((0.0, 0.0), 100.0);
        state.advance_position((30.0, 40.0), 100.0);
        state.fuel_used(50.0, Some(1));
        state.fuel_used(45.0, Some(1));

        assert_eq!(state.fuel_used(44.0, Some(2)), 0.0);
        assert_eq!(state.fuel_at_session_start, Some(44.0));
        assert_eq!(state.total_distance, 50.0);
    }

    #[test]
    fn missing_graphics_and_static_leave_defaults() {
        let config = DerivationConfig::default();
        let physics = PhysicsRecord { gear: 4, rpms: 6500, ..Default::default() };
        let (next, snapshot) = derive(
            &config,
            &DerivationState::default(),
            input(&physics, None, None, live_session(9)),
        );

        assert_eq!(next.last_position, None);
        assert_eq!(snapshot.session.session_id, 9);
        assert_eq!(snapshot.session.session_type, "Unknown");
        assert_eq!(snapshot.session.flag_type, "No_flag");
        assert_eq!(snapshot.session.number_of_laps, 1);
        assert!(snapshot.session.driver.is_empty());
        assert_eq!(snapshot.session.short_comment, "Tires Aid: 0 (SM)");
        assert_eq!(snapshot.metrics.gear, 4);
        assert_eq!(snapshot.metrics.engine_rpm, 6500);
        assert_eq!(snapshot.metrics.tire_radius_fl, 0.0);
        assert!(snapshot.metrics.tyre_compound.is_empty());
    }

    #[test]
    fn output_uses_flag_labels_and_omits_lap_validity() {
        let config = DerivationConfig::default();
        let physics = PhysicsRecord::default();
        let graphics = GraphicsRecord { flag: 5, ..Default::default() };
        let (_, snapshot) = derive(
            &config,
            &DerivationState::default(),
            input(&physics, Some(&graphics), None, live_session(3)),
        );
        assert_eq!(snapshot.session.flag_type, "Checkered_flag");

        let value = serde_json::to_value(&snapshot).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["flag_type"], "Checkered_flag");
        assert!(object.get("is_valid_lap").is_none());
    }

    #[test]
    fn units_are_normalized() {
        let config = DerivationConfig::default();
        let physics = PhysicsRecord {
            gas: 0.75,
            brake: 0.2,
            clutch: 1.0,
            brake_bias: 0.58,
            cg_height: 0.3,
            steer_angle: std::f32::consts::FRAC_PI_4,
            pitch: std::f32::consts::PI,
            ride_height: [0.05, 0.07],
            suspension_travel: [0.01, 0.02, 0.03, 0.04],
            wheel_slip: [0.1, 0.2, 0.0, 0.0],
            camber_rad: [-std::f32::consts::FRAC_PI_2, 0.0, 0.0, 0.0],
            local_angular_velocity: [0.0, std::f32::consts::PI, 0.0],
            brake_temp: [300.0, 310.0, 200.0, 190.0],
            tyre_temp_i: [80.0, 81.0, 82.0, 83.0],
            ..Default::default()
        };
        let graphics = GraphicsRecord {
            i_current_time: 83_500,
            i_last_time: 90_250,
            i_best_time: 88_000,
            session_time_left: 1_200_000.0,
            current_sector_index: 5,
            completed_laps: 3,
            ..Default::default()
        };
        let info = StaticInfoRecord {
            tyre_radius: [0.33, 0.33, 0.34, 0.34],
            aid_tire_rate: 1.0,
            player_name: "Ayrton".into(),
            ..Default::default()
        };

        let (_, snapshot) = derive(
            &config,
            &DerivationState::default(),
            input(&physics, Some(&graphics), Some(&info), live_session(1)),
        );
        let m = &snapshot.metrics;
        let s = &snapshot.session;

        assert_eq!(m.throttle_pos, 75.0);
        assert_eq!(m.clutch_pos, 100.0);
        assert!((m.brake_bias - 58.0).abs() < 1e-4);
        assert!((m.cg_height - 300.0).abs() < 1e-3);
        assert!((m.steering_angle - 45.0).abs() < 1e-4);
        assert_eq!(m.tire_slip_angle_rr, m.steering_angle);
        assert!((m.chassis_pitch_angle - 180.0).abs() < 1e-3);
        assert!((m.chassis_yaw_rate - 180.0).abs() < 1e-3);
        assert!((m.camber_fl + 90.0).abs() < 1e-4);
        assert!((m.ride_height_fr - 70.0).abs() < 1e-3);
        assert_eq!(m.ride_height_rl, 0.0);
        assert!((m.suspension_travel_rr - 40.0).abs() < 1e-3);
        assert!((m.tire_radius_rl - 340.0).abs() < 1e-3);
        assert!((m.tire_slip_ratio_fr - 20.0).abs() < 1e-4);
        assert_eq!(m.brake_temp, 250.0);
        assert_eq!(m.tire_temp_inner_rr, 83.0);

        assert_eq!(s.icurrent_time, 83.5);
        assert_eq!(s.lap_time, 90.25);
        assert_eq!(s.best_lap_time, 88.0);
        assert_eq!(s.session_time_left, 1200.0);
        assert_eq!(s.current_sector_index, 2);
        assert_eq!(s.number_of_laps, 4);
        assert_eq!(s.driver, "Ayrton");
        assert_eq!(s.short_comment, "Tires Aid: 1 (SM)");
    }

    #[test]
    fn engine_threads_state_between_calls() {
        let mut engine = DerivationEngine::new(DerivationConfig::default());
        let physics = PhysicsRecord { fuel: 30.0, ..Default::default() };

        for (x, z) in [(0.0, 0.0), (3.0, 4.0), (153.0, 4.0)] {
            let graphics = graphics_at(x, z);
            engine.derive(input(&physics, Some(&graphics), None, live_session(1)));
        }

        assert_eq!(engine.state().total_distance, 5.0);
        assert_eq!(engine.state().fuel_at_session_start, Some(30.0));
    }

    proptest! {
        #[test]
        fn distance_never_decreases(
            steps in prop::collection::vec((-300.0f32..300.0, -300.0f32..300.0), 1..60)
        ) {
            let mut state = DerivationState::default();
            let mut previous = 0.0f32;
            for position in steps {
                state.advance_position(position, 100.0);
                prop_assert!(state.total_distance >= previous);
                previous = state.total_distance;
            }
        }

        #[test]
        fn fuel_used_is_non_negative_and_monotonic(
            levels in prop::collection::vec(0.0f32..120.0, 1..60)
        ) {
            let mut state = DerivationState::default();
            let mut previous = 0.0f32;
            for fuel in levels {
                let used = state.fuel_used(fuel, Some(1));
                prop_assert!(used >= 0.0);
                prop_assert!(used >= previous);
                previous = used;
            }
        }
    }
}
