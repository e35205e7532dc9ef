//! AIS message types 1 (position report) and 5 (static and voyage data)
//! with 6-bit ASCII armoring.

use std::iter;

use crate::geo::GeoPoint;
use crate::nav::{AisVessel, ShipStatic};

pub const POSITION_REPORT_BITS: usize = 168;
pub const STATIC_VOYAGE_BITS: usize = 424;

/// Longest armored payload a single sentence carries.
pub const MAX_FRAGMENT_PAYLOAD: usize = 60;
pub const STATIC_VOYAGE_FRAGMENTS: usize =
    STATIC_VOYAGE_BITS.div_ceil(6).div_ceil(MAX_FRAGMENT_PAYLOAD);

const SOG_NOT_AVAILABLE: u64 = 1023;
const SOG_MAX: f64 = 102.2;
const ROT_NOT_AVAILABLE: i64 = -128;

const CALL_SIGN_CHARS: usize = 7;
const NAME_CHARS: usize = 20;
const DESTINATION_CHARS: usize = 20;
const EPFD_GPS: u64 = 1;
const DRAUGHT_MAX: f64 = 25.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReport {
    pub mmsi: u32,
    pub status: u8,
    /// Knots, 0.1 kn resolution; `None` when unavailable.
    pub speed_over_ground: Option<f64>,
    pub position: GeoPoint,
    /// Degrees, 0.1° resolution.
    pub course_over_ground: f64,
    pub heading: u16,
    pub second: u8,
}

impl PositionReport {
    pub fn from_vessel(vessel: &AisVessel, second: u32) -> Self {
        Self {
            mmsi: vessel.mmsi,
            status: vessel.status as u8,
            speed_over_ground: Some(vessel.speed_over_ground.clamp(0.0, SOG_MAX)),
            position: vessel.position,
            course_over_ground: vessel.course_over_ground,
            heading: (vessel.heading.round() as u16) % 360,
            second: (second % 60) as u8,
        }
    }

    /// Armored payload and the number of fill bits.
    pub fn encode(&self) -> (String, u8) {
        let mut bits = BitWriter::with_capacity(POSITION_REPORT_BITS);

        bits.push(1, 6);
        bits.push(0, 2);
        bits.push(u64::from(self.mmsi), 30);
        bits.push(u64::from(self.status), 4);
        bits.push_signed(ROT_NOT_AVAILABLE, 8);
        bits.push(
            self.speed_over_ground
                .map_or(SOG_NOT_AVAILABLE, |sog| (sog * 10.0).round() as u64),
            10,
        );
        bits.push(0, 1);
        bits.push_signed((self.position.longitude * 600_000.0).round() as i64, 28);
        bits.push_signed((self.position.latitude * 600_000.0).round() as i64, 27);
        bits.push(((self.course_over_ground * 10.0).round() as u64) % 3600, 12);
        bits.push(u64::from(self.heading), 9);
        bits.push(u64::from(self.second), 6);
        bits.push(0, 2);
        bits.push(0, 3);
        bits.push(0, 1);
        bits.push(0, 19);

        bits.armor()
    }

    pub fn decode(payload: &str) -> Option<Self> {
        let bits = BitReader::dearmor(payload)?;
        if bits.len() < POSITION_REPORT_BITS || bits.read(0, 6) != 1 {
            return None;
        }

        let sog = bits.read(50, 10);
        Some(Self {
            mmsi: bits.read(8, 30) as u32,
            status: bits.read(38, 4) as u8,
            speed_over_ground: (sog != SOG_NOT_AVAILABLE).then(|| sog as f64 / 10.0),
            position: GeoPoint::new(
                bits.read_signed(89, 27) as f64 / 600_000.0,
                bits.read_signed(61, 28) as f64 / 600_000.0,
            ),
            course_over_ground: bits.read(116, 12) as f64 / 10.0,
            heading: bits.read(128, 9) as u16,
            second: bits.read(137, 6) as u8,
        })
    }
}

/// Type 5 report. ETA is always sent as not available.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticVoyageReport {
    pub mmsi: u32,
    pub imo: u32,
    pub call_sign: String,
    pub name: String,
    pub ship_type: u8,
    pub to_bow: u16,
    pub to_stern: u16,
    pub to_port: u8,
    pub to_starboard: u8,
    /// Metres, 0.1 m resolution.
    pub draught: f64,
    pub destination: String,
}

impl StaticVoyageReport {
    pub fn from_ship(mmsi: u32, ship: &ShipStatic) -> Self {
        let [bow, stern, port, starboard] = ship.dimensions;
        Self {
            mmsi,
            imo: ship.imo,
            call_sign: ship.call_sign.clone(),
            name: ship.name.clone(),
            ship_type: ship.ship_type,
            to_bow: bow.min(511),
            to_stern: stern.min(511),
            to_port: port.min(63) as u8,
            to_starboard: starboard.min(63) as u8,
            draught: ship.draught.clamp(0.0, DRAUGHT_MAX),
            destination: ship.destination.clone(),
        }
    }

    /// Armored payload and the number of fill bits.
    pub fn encode(&self) -> (String, u8) {
        let mut bits = BitWriter::with_capacity(STATIC_VOYAGE_BITS);

        bits.push(5, 6);
        bits.push(0, 2);
        bits.push(u64::from(self.mmsi), 30);
        bits.push(0, 2);
        bits.push(u64::from(self.imo), 30);
        bits.push_text(&self.call_sign, CALL_SIGN_CHARS);
        bits.push_text(&self.name, NAME_CHARS);
        bits.push(u64::from(self.ship_type), 8);
        bits.push(u64::from(self.to_bow), 9);
        bits.push(u64::from(self.to_stern), 9);
        bits.push(u64::from(self.to_port), 6);
        bits.push(u64::from(self.to_starboard), 6);
        bits.push(EPFD_GPS, 4);
        // ETA month, day, hour, minute: not available.
        bits.push(0, 4);
        bits.push(0, 5);
        bits.push(24, 5);
        bits.push(60, 6);
        bits.push((self.draught * 10.0).round() as u64, 8);
        bits.push_text(&self.destination, DESTINATION_CHARS);
        bits.push(0, 1);
        bits.push(0, 1);

        bits.armor()
    }

    pub fn decode(payload: &str) -> Option<Self> {
        let bits = BitReader::dearmor(payload)?;
        if bits.len() < STATIC_VOYAGE_BITS || bits.read(0, 6) != 5 {
            return None;
        }

        Some(Self {
            mmsi: bits.read(8, 30) as u32,
            imo: bits.read(40, 30) as u32,
            call_sign: bits.read_text(70, CALL_SIGN_CHARS),
            name: bits.read_text(112, NAME_CHARS),
            ship_type: bits.read(232, 8) as u8,
            to_bow: bits.read(240, 9) as u16,
            to_stern: bits.read(249, 9) as u16,
            to_port: bits.read(258, 6) as u8,
            to_starboard: bits.read(264, 6) as u8,
            draught: bits.read(294, 8) as f64 / 10.0,
            destination: bits.read_text(302, DESTINATION_CHARS),
        })
    }
}

/// Splits an armored payload into sentence-sized pieces, in order.
pub fn fragments(payload: &str) -> Vec<&str> {
    let mut parts = Vec::with_capacity(payload.len().div_ceil(MAX_FRAGMENT_PAYLOAD).max(1));
    let mut rest = payload;
    // Armored payloads are ASCII, so any index is a char boundary.
    while rest.len() > MAX_FRAGMENT_PAYLOAD {
        let (head, tail) = rest.split_at(MAX_FRAGMENT_PAYLOAD);
        parts.push(head);
        rest = tail;
    }
    parts.push(rest);
    parts
}

#[derive(Debug, Default)]
struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
        }
    }

    /// Appends the low `width` bits of `value`, most significant first.
    fn push(&mut self, value: u64, width: usize) {
        for shift in (0..width).rev() {
            self.bits.push((value >> shift) & 1 == 1);
        }
    }

    fn push_signed(&mut self, value: i64, width: usize) {
        let mask = if width >= 64 { u64::MAX } else { (1 << width) - 1 };
        self.push(value as u64 & mask, width);
    }

    /// Six-bit text, truncated or padded with `@` to `chars`.
    fn push_text(&mut self, text: &str, chars: usize) {
        let sixbits = text.chars().map(text_sixbit).chain(iter::repeat(0)).take(chars);
        for sixbit in sixbits {
            self.push(u64::from(sixbit), 6);
        }
    }

    fn armor(&self) -> (String, u8) {
        let fill = (6 - self.bits.len() % 6) % 6;
        let payload = self
            .bits
            .chunks(6)
            .map(|chunk| {
                let mut sixbit = chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8);
                sixbit <<= 6 - chunk.len();
                armor_char(sixbit)
            })
            .collect();
        (payload, fill as u8)
    }
}

struct BitReader {
    bits: Vec<bool>,
}

impl BitReader {
    fn dearmor(payload: &str) -> Option<Self> {
        let mut bits = Vec::with_capacity(payload.len() * 6);
        for c in payload.chars() {
            let sixbit = dearmor_char(c)?;
            for shift in (0..6).rev() {
                bits.push((sixbit >> shift) & 1 == 1);
            }
        }
        Some(Self { bits })
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn read(&self, start: usize, width: usize) -> u64 {
        self.bits[start..start + width]
            .iter()
            .fold(0, |acc, &bit| (acc << 1) | bit as u64)
    }

    fn read_signed(&self, start: usize, width: usize) -> i64 {
        let raw = self.read(start, width);
        let shift = 64 - width;
        ((raw << shift) as i64) >> shift
    }

    fn read_text(&self, start: usize, chars: usize) -> String {
        let text: String = (0..chars)
            .map(|i| sixbit_text(self.read(start + i * 6, 6) as u8))
            .collect();
        text.trim_end_matches(['@', ' ']).to_owned()
    }
}

fn text_sixbit(c: char) -> u8 {
    match c.to_ascii_uppercase() {
        c @ '@'..='_' => c as u8 - 64,
        c @ ' '..='?' => c as u8,
        _ => b' ',
    }
}

fn sixbit_text(sixbit: u8) -> char {
    if sixbit < 32 {
        (sixbit + 64) as char
    } else {
        sixbit as char
    }
}

fn armor_char(sixbit: u8) -> char {
    let code = if sixbit < 40 { sixbit + 48 } else { sixbit + 56 };
    code as char
}

fn dearmor_char(c: char) -> Option<u8> {
    let code = u8::try_from(c).ok()?;
    match code {
        48..=87 => Some(code - 48),
        96..=119 => Some(code - 56),
        _ => None,
    }
}
