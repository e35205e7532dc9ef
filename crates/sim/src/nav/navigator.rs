use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulatorConfig;
use crate::geo::{self, GeoPoint};
use crate::route::{Leg, Route};

use super::jitter::{Drift, jitter, jitter_angle, jitter_non_negative};
use super::state::{
    AisVessel, Engine, GpsFix, NavStatus, ShipStatic, Steering, VesselState, Wind,
};

pub const ARRIVAL_RADIUS_NM: f64 = 0.05;

// Jitter bands, as a fraction of the nominal value unless noted.
const SPEED_JITTER: f64 = 0.05;
const DEPTH_JITTER: f64 = 0.10;
const WIND_SPEED_JITTER: f64 = 0.10;
const WIND_ANGLE_JITTER_DEG: f64 = 5.0;
const TEMPERATURE_JITTER: f64 = 0.05;
const RPM_JITTER: f64 = 0.05;
const PITCH_JITTER: f64 = 0.10;
const SATELLITE_JITTER: f64 = 0.20;
const DOP_JITTER: f64 = 0.20;
const ALTITUDE_JITTER: f64 = 0.10;

const NOMINAL_SATELLITES: f64 = 8.0;
const MIN_SATELLITES: i64 = 4;
const MAX_SATELLITES: i64 = 12;
const MIN_DOP: f64 = 0.5;
const ANTENNA_ALTITUDE_M: f64 = 2.0;
const TRANSDUCER_OFFSET_M: f64 = 0.3;

const TARGET_MMSI: u32 = 503_654_321;
const TARGET_OFFSET_NM: f64 = 0.8;
const TARGET_SPEED_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Default)]
struct NavigatorProgress {
    leg: usize,
    distance_on_leg: f64,
    elapsed: Duration,
    arrived: bool,
}

/// Slowly varying environment the per-tick jitter is applied on top of.
#[derive(Debug, Clone)]
struct Ambient {
    wind_direction: Drift,
    wind_speed: Drift,
    water_temperature: Drift,
    air_temperature: Drift,
    depth: Drift,
    engine_rpm: Drift,
    engine_pitch: Drift,
}

impl Default for Ambient {
    fn default() -> Self {
        Self {
            wind_direction: Drift::circular(255.1, 2.0),
            wind_speed: Drift::clamped(27.8, 1.0, 0.0, 60.0),
            water_temperature: Drift::clamped(16.7, 0.2, -2.0, 35.0),
            air_temperature: Drift::clamped(19.5, 0.2, -30.0, 45.0),
            depth: Drift::clamped(8.5, 0.1, 1.0, 200.0),
            engine_rpm: Drift::clamped(1850.0, 5.0, 600.0, 3200.0),
            engine_pitch: Drift::clamped(10.5, 0.5, 0.0, 30.0),
        }
    }
}

impl Ambient {
    fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.wind_direction.advance(rng);
        self.wind_speed.advance(rng);
        self.water_temperature.advance(rng);
        self.air_temperature.advance(rng);
        self.depth.advance(rng);
        self.engine_rpm.advance(rng);
        self.engine_pitch.advance(rng);
    }
}

/// Moves the vessel along a [`Route`] and produces a fresh [`VesselState`]
/// per tick.
///
/// Closed routes are followed forever. Open routes end at their final
/// waypoint, where the vessel stops and keeps reporting the final leg's
/// heading.
pub struct Navigator<R = StdRng> {
    route: Route,
    legs: Vec<Leg>,
    total_length_nm: f64,
    speed_knots: f64,
    magnetic_variation: f64,
    mmsi: u32,
    vessel: ShipStatic,
    progress: NavigatorProgress,
    ambient: Ambient,
    rng: R,
}

impl Navigator<StdRng> {
    pub fn new(route: Route, config: &SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(route, config, rng)
    }
}

impl<R: Rng> Navigator<R> {
    pub fn with_rng(route: Route, config: &SimulatorConfig, rng: R) -> Self {
        let legs: Vec<Leg> = route.legs().collect();
        let total_length_nm = legs.iter().map(|leg| leg.length_nm).sum();

        Self {
            route,
            legs,
            total_length_nm,
            speed_knots: config.speed_knots.max(0.0),
            magnetic_variation: config.magnetic_variation,
            mmsi: config.mmsi,
            vessel: config.vessel.clone(),
            progress: NavigatorProgress::default(),
            ambient: Ambient::default(),
            rng,
        }
    }

    pub fn advance(&mut self, dt: Duration) -> VesselState {
        self.progress.elapsed += dt;
        let distance = self.speed_knots * dt.as_secs_f64() / 3600.0;
        self.travel(distance);

        log::trace!(
            "t+{:.0}s leg {} at {:.4} nm",
            self.progress.elapsed.as_secs_f64(),
            self.progress.leg,
            self.progress.distance_on_leg
        );

        let leg = self.legs[self.progress.leg];
        let position = geo::destination(leg.start, leg.bearing, self.progress.distance_on_leg);
        let heading = leg.bearing;

        let nominal_speed = if self.progress.arrived {
            0.0
        } else {
            self.speed_knots
        };

        self.ambient.advance(&mut self.rng);
        let rng = &mut self.rng;

        let speed_over_ground = jitter_non_negative(rng, nominal_speed, SPEED_JITTER);
        let water_speed = jitter_non_negative(rng, nominal_speed, SPEED_JITTER);

        let depth = self.ambient.depth.value();
        let depth_of_water = jitter_non_negative(rng, depth, DEPTH_JITTER);
        let depth_below_transducer =
            jitter_non_negative(rng, (depth - TRANSDUCER_OFFSET_M).max(0.0), DEPTH_JITTER);

        let wind = Wind::from_true(
            jitter_angle(rng, self.ambient.wind_direction.value(), WIND_ANGLE_JITTER_DEG),
            jitter_non_negative(rng, self.ambient.wind_speed.value(), WIND_SPEED_JITTER),
            heading,
            speed_over_ground,
        );

        let water_temperature = jitter(rng, self.ambient.water_temperature.value(), TEMPERATURE_JITTER);
        let air_temperature = jitter(rng, self.ambient.air_temperature.value(), TEMPERATURE_JITTER);

        let engine = Engine {
            rpm: jitter_non_negative(rng, self.ambient.engine_rpm.value(), RPM_JITTER),
            pitch: jitter_non_negative(rng, self.ambient.engine_pitch.value(), PITCH_JITTER),
        };

        let satellites = jitter(rng, NOMINAL_SATELLITES, SATELLITE_JITTER).round() as i64;
        let fix = GpsFix {
            satellites: satellites.clamp(MIN_SATELLITES, MAX_SATELLITES) as u8,
            pdop: jitter(rng, 2.0, DOP_JITTER).max(MIN_DOP),
            hdop: jitter(rng, 1.0, DOP_JITTER).max(MIN_DOP),
            vdop: jitter(rng, 1.0, DOP_JITTER).max(MIN_DOP),
            altitude: jitter(rng, ANTENNA_ALTITUDE_M, ALTITUDE_JITTER),
        };

        let steering = steering(&leg, position, heading, speed_over_ground);

        let own_ship = AisVessel {
            mmsi: self.mmsi,
            status: if self.progress.arrived {
                NavStatus::AtAnchor
            } else {
                NavStatus::UnderWayUsingEngine
            },
            position,
            course_over_ground: heading,
            speed_over_ground,
            heading,
        };
        let ais_target = synthetic_target(position, heading, speed_over_ground);

        VesselState {
            timestamp: Utc::now(),
            position,
            heading_true: heading,
            course_over_ground: heading,
            speed_over_ground,
            water_speed,
            magnetic_variation: self.magnetic_variation,
            depth_below_transducer,
            depth_of_water,
            transducer_offset: TRANSDUCER_OFFSET_M,
            wind,
            water_temperature,
            air_temperature,
            engine,
            fix,
            steering,
            own_ship,
            own_ship_static: self.vessel.clone(),
            ais_target,
            ais_target_static: target_static(),
        }
    }

    fn travel(&mut self, distance: f64) {
        if self.progress.arrived {
            return;
        }

        let closed = self.route.is_closed();
        if self.total_length_nm <= 0.0 {
            // Every waypoint is the same point: an open route is already there.
            if !closed {
                self.progress.leg = self.legs.len() - 1;
                self.progress.distance_on_leg = 0.0;
                self.progress.arrived = true;
                log::info!(
                    "Route has zero length, holding at {}",
                    self.legs[self.progress.leg].end
                );
            }
            return;
        }
        if distance <= 0.0 {
            return;
        }

        let mut remaining = distance;
        if closed && remaining > self.total_length_nm {
            remaining %= self.total_length_nm;
        }

        loop {
            let leg = &self.legs[self.progress.leg];
            let left_on_leg = leg.length_nm - self.progress.distance_on_leg;

            if remaining < left_on_leg {
                self.progress.distance_on_leg += remaining;
                return;
            }
            remaining -= left_on_leg;

            if self.progress.leg + 1 < self.legs.len() {
                self.progress.leg += 1;
                self.progress.distance_on_leg = 0.0;
            } else if closed {
                self.progress.leg = 0;
                self.progress.distance_on_leg = 0.0;
            } else {
                self.progress.distance_on_leg = leg.length_nm;
                self.progress.arrived = true;
                log::info!(
                    "Arrived at final waypoint {} after {:.0}s",
                    leg.end,
                    self.progress.elapsed.as_secs_f64()
                );
                return;
            }

            log::debug!(
                "Waypoint reached, steering for waypoint {}",
                self.legs[self.progress.leg].end_index + 1
            );
        }
    }
}

fn waypoint_id(index: usize) -> String {
    format!("WP{:02}", index + 1)
}

fn steering(leg: &Leg, position: GeoPoint, course: f64, speed: f64) -> Steering {
    let bearing_to_destination = geo::initial_bearing(position, leg.end);
    let range_nm = geo::distance_nm(position, leg.end);
    let closing_velocity = speed * (bearing_to_destination - course).to_radians().cos();

    Steering {
        origin_id: waypoint_id(leg.start_index),
        destination_id: waypoint_id(leg.end_index),
        destination_index: leg.end_index,
        destination: leg.end,
        bearing_origin_to_destination: leg.bearing,
        bearing_to_destination,
        range_nm,
        cross_track_nm: geo::cross_track_nm(leg.start, leg.end, position),
        closing_velocity,
        arrived: range_nm <= ARRIVAL_RADIUS_NM,
    }
}

/// A vessel passing on the reciprocal course, fine on the starboard bow.
fn synthetic_target(position: GeoPoint, heading: f64, speed: f64) -> AisVessel {
    let course = geo::normalize_degrees(heading + 180.0);
    AisVessel {
        mmsi: TARGET_MMSI,
        status: NavStatus::UnderWayUsingEngine,
        position: geo::destination(position, heading + 45.0, TARGET_OFFSET_NM),
        course_over_ground: course,
        speed_over_ground: speed * TARGET_SPEED_RATIO,
        heading: course,
    }
}

fn target_static() -> ShipStatic {
    ShipStatic {
        name: String::from("PACIFIC TRADER"),
        call_sign: String::from("VRXT7"),
        imo: 9_412_345,
        ship_type: 70,
        dimensions: [150, 30, 14, 14],
        draught: 8.4,
        destination: String::from("NEWCASTLE"),
    }
}
