use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// One tick's worth of simulated instrument readings.
///
/// Angles are degrees true unless stated otherwise, speeds are knots, depths
/// metres and temperatures degrees Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselState {
    pub timestamp: DateTime<Utc>,
    pub position: GeoPoint,
    pub heading_true: f64,
    pub course_over_ground: f64,
    pub speed_over_ground: f64,
    pub water_speed: f64,
    /// East positive.
    pub magnetic_variation: f64,
    pub depth_below_transducer: f64,
    pub depth_of_water: f64,
    pub transducer_offset: f64,
    pub wind: Wind,
    pub water_temperature: f64,
    pub air_temperature: f64,
    pub engine: Engine,
    pub fix: GpsFix,
    pub steering: Steering,
    pub own_ship: AisVessel,
    pub own_ship_static: ShipStatic,
    pub ais_target: AisVessel,
    pub ais_target_static: ShipStatic,
}

impl VesselState {
    pub fn heading_magnetic(&self) -> f64 {
        crate::geo::normalize_degrees(self.heading_true - self.magnetic_variation)
    }

    pub fn course_magnetic(&self) -> f64 {
        crate::geo::normalize_degrees(self.course_over_ground - self.magnetic_variation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    /// Direction the true wind blows from.
    pub true_direction: f64,
    pub true_speed: f64,
    /// Relative to the bow, clockwise.
    pub apparent_angle: f64,
    pub apparent_speed: f64,
}

impl Wind {
    pub fn from_true(true_direction: f64, true_speed: f64, heading: f64, boat_speed: f64) -> Self {
        let relative = (true_direction - heading).to_radians();
        let ahead = true_speed * relative.cos() + boat_speed;
        let abeam = true_speed * relative.sin();

        let apparent_speed = ahead.hypot(abeam);
        let apparent_angle = if apparent_speed == 0.0 {
            0.0
        } else {
            crate::geo::normalize_degrees(abeam.atan2(ahead).to_degrees())
        };

        Self {
            true_direction,
            true_speed,
            apparent_angle,
            apparent_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    pub rpm: f64,
    /// Propeller pitch, percent.
    pub pitch: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub satellites: u8,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
    /// Antenna altitude above mean sea level, metres.
    pub altitude: f64,
}

/// Autopilot view of the active leg.
#[derive(Debug, Clone, PartialEq)]
pub struct Steering {
    pub origin_id: String,
    pub destination_id: String,
    pub destination_index: usize,
    pub destination: GeoPoint,
    pub bearing_origin_to_destination: f64,
    pub bearing_to_destination: f64,
    pub range_nm: f64,
    /// Positive when the vessel is right of track.
    pub cross_track_nm: f64,
    pub closing_velocity: f64,
    pub arrived: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStatus {
    UnderWayUsingEngine = 0,
    AtAnchor = 1,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AisVessel {
    pub mmsi: u32,
    pub status: NavStatus,
    pub position: GeoPoint,
    pub course_over_ground: f64,
    pub speed_over_ground: f64,
    pub heading: f64,
}

/// Identity and voyage data a vessel broadcasts in AIS static reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipStatic {
    pub name: String,
    pub call_sign: String,
    pub imo: u32,
    /// AIS ship and cargo type, 37 is a pleasure craft.
    pub ship_type: u8,
    /// Metres from the position antenna to bow, stern, port and starboard.
    pub dimensions: [u16; 4],
    /// Metres.
    pub draught: f64,
    pub destination: String,
}

impl Default for ShipStatic {
    fn default() -> Self {
        Self {
            name: String::from("NMEA SIM"),
            call_sign: String::from("VNS1234"),
            imo: 0,
            ship_type: 37,
            dimensions: [9, 3, 2, 2],
            draught: 1.8,
            destination: String::from("SYDNEY"),
        }
    }
}
