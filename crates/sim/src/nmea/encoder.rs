use chrono::{Datelike, Timelike};

use crate::nav::{AisVessel, ShipStatic, VesselState};

use super::ais::{self, PositionReport, STATIC_VOYAGE_FRAGMENTS, StaticVoyageReport};
use super::format::{
    self, KNOTS_TO_KMH, KNOTS_TO_MS, METRES_TO_FATHOMS, METRES_TO_FEET, east_west, status,
};
use super::sentence::SentenceBuilder;

/// PRNs reported as in use by GPGSA, first `satellites` of them.
const SATELLITE_PRNS: [u8; 12] = [2, 5, 8, 11, 13, 15, 18, 20, 22, 25, 27, 30];

const AIS_CHANNEL: char = 'A';
/// Sequential message ids for multi-sentence AIS messages cycle through 0..=9.
const AIS_SEQUENCE_IDS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Rmc,
    Gga,
    Gll,
    Vtg,
    Gsa,
    Zda,
    Vhw,
    Hdt,
    Vbw,
    Mwd,
    Mwv,
    Mtw,
    Dpt,
    Dbt,
    Rpm,
    /// Second engine, idling.
    Rpm2,
    Apb,
    Rmb,
    Vdo,
    Vdm,
    VdoStatic,
    VdmStatic,
}

impl SentenceKind {
    /// Emission order of a batch.
    pub const ALL: [SentenceKind; 22] = [
        SentenceKind::Rmc,
        SentenceKind::Gga,
        SentenceKind::Gll,
        SentenceKind::Vtg,
        SentenceKind::Gsa,
        SentenceKind::Zda,
        SentenceKind::Vhw,
        SentenceKind::Hdt,
        SentenceKind::Vbw,
        SentenceKind::Mwd,
        SentenceKind::Mwv,
        SentenceKind::Mtw,
        SentenceKind::Dpt,
        SentenceKind::Dbt,
        SentenceKind::Rpm,
        SentenceKind::Rpm2,
        SentenceKind::Apb,
        SentenceKind::Rmb,
        SentenceKind::Vdo,
        SentenceKind::Vdm,
        SentenceKind::VdoStatic,
        SentenceKind::VdmStatic,
    ];

    /// Lines in one batch, counting every fragment.
    pub const BATCH_LEN: usize = {
        let mut total = 0;
        let mut i = 0;
        while i < Self::ALL.len() {
            total += Self::ALL[i].sentence_count();
            i += 1;
        }
        total
    };

    /// Talker and sentence identifier.
    pub const fn address(self) -> &'static str {
        match self {
            SentenceKind::Rmc => "GPRMC",
            SentenceKind::Gga => "GPGGA",
            SentenceKind::Gll => "GPGLL",
            SentenceKind::Vtg => "GPVTG",
            SentenceKind::Gsa => "GPGSA",
            SentenceKind::Zda => "GPZDA",
            SentenceKind::Vhw => "IIVHW",
            SentenceKind::Hdt => "IIHDT",
            SentenceKind::Vbw => "IIVBW",
            SentenceKind::Mwd => "WIMWD",
            SentenceKind::Mwv => "WIMWV",
            SentenceKind::Mtw => "IIMTW",
            SentenceKind::Dpt => "SDDPT",
            SentenceKind::Dbt => "SDDBT",
            SentenceKind::Rpm | SentenceKind::Rpm2 => "IIRPM",
            SentenceKind::Apb => "IIAPB",
            SentenceKind::Rmb => "GPRMB",
            SentenceKind::Vdo | SentenceKind::VdoStatic => "AIVDO",
            SentenceKind::Vdm | SentenceKind::VdmStatic => "AIVDM",
        }
    }

    /// Sentences this kind takes on the wire.
    pub const fn sentence_count(self) -> usize {
        match self {
            SentenceKind::VdoStatic | SentenceKind::VdmStatic => STATIC_VOYAGE_FRAGMENTS,
            _ => 1,
        }
    }
}

/// Renders a [`VesselState`] into NMEA 0183 sentences.
///
/// Holds the sequential message id shared by multi-sentence AIS messages,
/// so one encoder should serve one output stream.
#[derive(Debug, Clone, Default)]
pub struct SentenceEncoder {
    sequence: u8,
}

impl SentenceEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sentence of a batch, in [`SentenceKind::ALL`] order.
    pub fn encode(&mut self, state: &VesselState) -> Vec<String> {
        let mut sentences = Vec::with_capacity(SentenceKind::BATCH_LEN);
        for kind in SentenceKind::ALL {
            sentences.extend(self.encode_one(kind, state));
        }
        sentences
    }

    /// One batch as wire text, every sentence CRLF terminated.
    pub fn encode_batch(&mut self, state: &VesselState) -> String {
        let mut batch = String::with_capacity(SentenceKind::BATCH_LEN * 72);
        for sentence in self.encode(state) {
            batch.push_str(&sentence);
            batch.push_str("\r\n");
        }
        batch
    }

    /// The sentences for one kind; more than one only for fragmented AIS messages.
    pub fn encode_one(&mut self, kind: SentenceKind, state: &VesselState) -> Vec<String> {
        let b = || SentenceBuilder::parametric(kind.address());
        let sentence = match kind {
            SentenceKind::Rmc => rmc(b(), state),
            SentenceKind::Gga => gga(b(), state),
            SentenceKind::Gll => gll(b(), state),
            SentenceKind::Vtg => vtg(b(), state),
            SentenceKind::Gsa => gsa(b(), state),
            SentenceKind::Zda => zda(b(), state),
            SentenceKind::Vhw => vhw(b(), state),
            SentenceKind::Hdt => b().angle(state.heading_true).field('T').finish(),
            SentenceKind::Vbw => b()
                .fixed(state.water_speed, 1)
                .fixed(0.0, 1)
                .field('A')
                .fixed(state.speed_over_ground, 1)
                .fixed(0.0, 1)
                .field('A')
                .finish(),
            SentenceKind::Mwd => mwd(b(), state),
            SentenceKind::Mwv => b()
                .angle(state.wind.apparent_angle)
                .field('R')
                .fixed(state.wind.apparent_speed, 1)
                .field('N')
                .field('A')
                .finish(),
            SentenceKind::Mtw => b().fixed(state.water_temperature, 1).field('C').finish(),
            SentenceKind::Dpt => b()
                .fixed((state.depth_of_water - state.transducer_offset).max(0.0), 1)
                .fixed(state.transducer_offset, 1)
                .finish(),
            SentenceKind::Dbt => {
                let depth = state.depth_below_transducer;
                b().fixed(depth * METRES_TO_FEET, 1)
                    .field('f')
                    .fixed(depth, 1)
                    .field('M')
                    .fixed(depth * METRES_TO_FATHOMS, 1)
                    .field('F')
                    .finish()
            }
            SentenceKind::Rpm => rpm(b(), 1, state.engine.rpm, state.engine.pitch),
            SentenceKind::Rpm2 => rpm(b(), 2, 0.0, state.engine.pitch),
            SentenceKind::Apb => apb(b(), state),
            SentenceKind::Rmb => rmb(b(), state),
            SentenceKind::Vdo => position_report(kind, &state.own_ship, state),
            SentenceKind::Vdm => position_report(kind, &state.ais_target, state),
            SentenceKind::VdoStatic => {
                return self.static_report(kind, state.own_ship.mmsi, &state.own_ship_static);
            }
            SentenceKind::VdmStatic => {
                return self.static_report(kind, state.ais_target.mmsi, &state.ais_target_static);
            }
        };
        vec![sentence]
    }

    fn static_report(&mut self, kind: SentenceKind, mmsi: u32, ship: &ShipStatic) -> Vec<String> {
        let (payload, fill) = StaticVoyageReport::from_ship(mmsi, ship).encode();
        let parts = ais::fragments(&payload);
        let count = parts.len();
        let sequence = self.next_sequence();

        parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let number = i + 1;
                // Fill bits only ever pad the last fragment.
                let fill = if number == count { fill } else { 0 };
                SentenceBuilder::encapsulated(kind.address())
                    .field(count)
                    .field(number)
                    .field(sequence)
                    .field(AIS_CHANNEL)
                    .field(part)
                    .field(fill)
                    .finish()
            })
            .collect()
    }

    fn next_sequence(&mut self) -> u8 {
        let id = self.sequence;
        self.sequence = (self.sequence + 1) % AIS_SEQUENCE_IDS;
        id
    }
}

/// Single-sentence type 1 report; the sequential id stays empty.
fn position_report(kind: SentenceKind, vessel: &AisVessel, state: &VesselState) -> String {
    let report = PositionReport::from_vessel(vessel, state.timestamp.second());
    let (payload, fill) = report.encode();
    SentenceBuilder::encapsulated(kind.address())
        .field(1)
        .field(1)
        .empty()
        .field(AIS_CHANNEL)
        .field(payload)
        .field(fill)
        .finish()
}

fn rpm(b: SentenceBuilder, engine: u8, rpm: f64, pitch: f64) -> String {
    b.field('E')
        .field(engine)
        .fixed(rpm, 1)
        .fixed(pitch, 1)
        .field('A')
        .finish()
}

fn rmc(b: SentenceBuilder, s: &VesselState) -> String {
    let (lat, ns) = format::latitude(s.position.latitude);
    let (lon, ew) = format::longitude(s.position.longitude);
    let (variation, variation_ew) = east_west(s.magnetic_variation);

    b.field(format::time(&s.timestamp))
        .field(status(true))
        .field(lat)
        .field(ns)
        .field(lon)
        .field(ew)
        .fixed(s.speed_over_ground, 1)
        .angle(s.course_over_ground)
        .field(format::date(&s.timestamp))
        .fixed(variation, 1)
        .field(variation_ew)
        .field('A')
        .finish()
}

fn gga(b: SentenceBuilder, s: &VesselState) -> String {
    let (lat, ns) = format::latitude(s.position.latitude);
    let (lon, ew) = format::longitude(s.position.longitude);

    b.field(format::time(&s.timestamp))
        .field(lat)
        .field(ns)
        .field(lon)
        .field(ew)
        .field(1)
        .field(format_args!("{:02}", s.fix.satellites))
        .fixed(s.fix.hdop, 1)
        .fixed(s.fix.altitude, 1)
        .field('M')
        .empty()
        .field('M')
        .empty()
        .empty()
        .finish()
}

fn gll(b: SentenceBuilder, s: &VesselState) -> String {
    let (lat, ns) = format::latitude(s.position.latitude);
    let (lon, ew) = format::longitude(s.position.longitude);

    b.field(lat)
        .field(ns)
        .field(lon)
        .field(ew)
        .field(format::time(&s.timestamp))
        .field(status(true))
        .field('A')
        .finish()
}

fn vtg(b: SentenceBuilder, s: &VesselState) -> String {
    b.angle(s.course_over_ground)
        .field('T')
        .angle(s.course_magnetic())
        .field('M')
        .fixed(s.speed_over_ground, 1)
        .field('N')
        .fixed(s.speed_over_ground * KNOTS_TO_KMH, 1)
        .field('K')
        .field('A')
        .finish()
}

fn gsa(b: SentenceBuilder, s: &VesselState) -> String {
    let used = usize::from(s.fix.satellites).min(SATELLITE_PRNS.len());
    let mut b = b.field('A').field(3);
    for (i, prn) in SATELLITE_PRNS.iter().enumerate() {
        b = if i < used {
            b.field(format_args!("{:02}", prn))
        } else {
            b.empty()
        };
    }
    b.fixed(s.fix.pdop, 1)
        .fixed(s.fix.hdop, 1)
        .fixed(s.fix.vdop, 1)
        .finish()
}

fn zda(b: SentenceBuilder, s: &VesselState) -> String {
    let ts = &s.timestamp;
    b.field(format::time(ts))
        .field(format_args!("{:02}", ts.day()))
        .field(format_args!("{:02}", ts.month()))
        .field(format_args!("{:04}", ts.year()))
        .field("00")
        .field("00")
        .finish()
}

fn vhw(b: SentenceBuilder, s: &VesselState) -> String {
    b.angle(s.heading_true)
        .field('T')
        .angle(s.heading_magnetic())
        .field('M')
        .fixed(s.water_speed, 1)
        .field('N')
        .fixed(s.water_speed * KNOTS_TO_KMH, 1)
        .field('K')
        .finish()
}

fn mwd(b: SentenceBuilder, s: &VesselState) -> String {
    b.angle(s.wind.true_direction)
        .field('T')
        .angle(s.wind.true_direction - s.magnetic_variation)
        .field('M')
        .fixed(s.wind.true_speed, 1)
        .field('N')
        .fixed(s.wind.true_speed * KNOTS_TO_MS, 1)
        .field('M')
        .finish()
}

/// Steer left when right of track.
fn steer_direction(cross_track_nm: f64) -> char {
    if cross_track_nm > 0.0 { 'L' } else { 'R' }
}

fn apb(b: SentenceBuilder, s: &VesselState) -> String {
    let st = &s.steering;
    b.field(status(true))
        .field(status(true))
        .fixed(st.cross_track_nm.abs(), 2)
        .field(steer_direction(st.cross_track_nm))
        .field('N')
        .field(status(st.arrived))
        .field(status(st.arrived))
        .angle(st.bearing_origin_to_destination)
        .field('T')
        .field(&st.destination_id)
        .angle(st.bearing_to_destination)
        .field('T')
        .angle(st.bearing_to_destination)
        .field('T')
        .field('A')
        .finish()
}

fn rmb(b: SentenceBuilder, s: &VesselState) -> String {
    let st = &s.steering;
    let (lat, ns) = format::latitude(st.destination.latitude);
    let (lon, ew) = format::longitude(st.destination.longitude);

    b.field(status(true))
        .fixed(st.cross_track_nm.abs(), 2)
        .field(steer_direction(st.cross_track_nm))
        .field(&st.origin_id)
        .field(&st.destination_id)
        .field(lat)
        .field(ns)
        .field(lon)
        .field(ew)
        .fixed(st.range_nm, 3)
        .angle(st.bearing_to_destination)
        .fixed(st.closing_velocity, 1)
        .field(status(st.arrived))
        .field('A')
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::nav::{Engine, GpsFix, NavStatus, Steering, Wind};
    use crate::nmea::ais::MAX_FRAGMENT_PAYLOAD;
    use crate::nmea::checksum;
    use chrono::{TimeZone, Utc};

    fn state() -> VesselState {
        let position = GeoPoint::new(-33.8587, 151.2140);
        let own_ship = AisVessel {
            mmsi: 503_123_456,
            status: NavStatus::UnderWayUsingEngine,
            position,
            course_over_ground: 15.2,
            speed_over_ground: 5.1,
            heading: 15.2,
        };

        VesselState {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap(),
            position,
            heading_true: 15.2,
            course_over_ground: 15.2,
            speed_over_ground: 5.1,
            water_speed: 4.9,
            magnetic_variation: -12.5,
            depth_below_transducer: 8.2,
            depth_of_water: 8.6,
            transducer_offset: 0.3,
            wind: Wind::from_true(255.0, 20.0, 15.2, 5.1),
            water_temperature: 16.7,
            air_temperature: 19.5,
            engine: Engine {
                rpm: 1850.4,
                pitch: 10.5,
            },
            fix: GpsFix {
                satellites: 7,
                pdop: 2.1,
                hdop: 0.9,
                vdop: 1.1,
                altitude: 2.0,
            },
            steering: Steering {
                origin_id: "WP01".into(),
                destination_id: "WP02".into(),
                destination_index: 1,
                destination: GeoPoint::new(-33.8566, 151.2147),
                bearing_origin_to_destination: 15.2,
                bearing_to_destination: 15.3,
                range_nm: 0.101,
                cross_track_nm: -0.004,
                closing_velocity: 5.1,
                arrived: false,
            },
            own_ship,
            own_ship_static: ShipStatic::default(),
            ais_target: AisVessel {
                mmsi: 503_654_321,
                ..own_ship
            },
            ais_target_static: ShipStatic {
                name: String::from("PACIFIC TRADER"),
                ..ShipStatic::default()
            },
        }
    }

    fn one(kind: SentenceKind, state: &VesselState) -> String {
        let mut sentences = SentenceEncoder::new().encode_one(kind, state);
        assert_eq!(sentences.len(), 1, "{:?} is not a single sentence", kind);
        sentences.remove(0)
    }

    fn fields(sentence: &str) -> Vec<&str> {
        let body = &sentence[1..sentence.rfind('*').unwrap()];
        body.split(',').collect()
    }

    #[test]
    fn batch_order_and_checksums() {
        let sentences = SentenceEncoder::new().encode(&state());
        assert_eq!(sentences.len(), SentenceKind::BATCH_LEN);
        assert_eq!(SentenceKind::BATCH_LEN, SentenceKind::ALL.len() + 2);

        let addresses = SentenceKind::ALL
            .iter()
            .flat_map(|kind| std::iter::repeat_n(kind.address(), kind.sentence_count()));
        for (sentence, address) in sentences.iter().zip(addresses) {
            assert_eq!(fields(sentence)[0], address);
            assert!(checksum::verify(sentence), "bad checksum: {}", sentence);
            assert!(sentence.len() <= 82, "too long: {}", sentence);
        }
    }

    #[test]
    fn checksum_matches_reparsed_body() {
        for sentence in SentenceEncoder::new().encode(&state()) {
            let (body, hex) = sentence[1..].rsplit_once('*').unwrap();
            let expected = body.bytes().fold(0u8, |acc, b| acc ^ b);
            assert_eq!(hex, format!("{:02X}", expected));
        }
    }

    #[test]
    fn rmc_layout() {
        let rmc = one(SentenceKind::Rmc, &state());
        assert_eq!(
            fields(&rmc),
            vec![
                "GPRMC",
                "070503.000",
                "A",
                "3351.5220",
                "S",
                "15112.8400",
                "E",
                "5.1",
                "15.2",
                "090324",
                "12.5",
                "W",
                "A"
            ]
        );
    }

    #[test]
    fn gga_and_gsa_report_fix() {
        let gga = one(SentenceKind::Gga, &state());
        let f = fields(&gga);
        assert_eq!(f.len(), 15);
        assert_eq!(f[6], "1");
        assert_eq!(f[7], "07");
        assert_eq!(f[8], "0.9");

        let gsa = one(SentenceKind::Gsa, &state());
        let f = fields(&gsa);
        assert_eq!(f.len(), 18);
        assert_eq!(&f[3..10], &["02", "05", "08", "11", "13", "15", "18"]);
        assert!(f[10..15].iter().all(|slot| slot.is_empty()));
        assert_eq!(&f[15..], &["2.1", "0.9", "1.1"]);
    }

    #[test]
    fn magnetic_fields_apply_variation() {
        let vtg = one(SentenceKind::Vtg, &state());
        let f = fields(&vtg);
        assert_eq!(f[1], "15.2");
        assert_eq!(f[3], "27.7");
        assert_eq!(f[7], "9.4");
    }

    #[test]
    fn depth_sentences() {
        let dpt = one(SentenceKind::Dpt, &state());
        assert_eq!(fields(&dpt), vec!["SDDPT", "8.3", "0.3"]);

        let dbt = one(SentenceKind::Dbt, &state());
        assert_eq!(fields(&dbt), vec!["SDDBT", "26.9", "f", "8.2", "M", "4.5", "F"]);
    }

    #[test]
    fn zda_uses_full_year() {
        let zda = one(SentenceKind::Zda, &state());
        assert_eq!(
            fields(&zda),
            vec!["GPZDA", "070503.000", "09", "03", "2024", "00", "00"]
        );
    }

    #[test]
    fn rmb_points_at_destination() {
        let rmb = one(SentenceKind::Rmb, &state());
        let f = fields(&rmb);
        assert_eq!(f[1], "A");
        assert_eq!(f[2], "0.00");
        assert_eq!(f[3], "R");
        assert_eq!(f[4], "WP01");
        assert_eq!(f[5], "WP02");
        assert_eq!(f[10], "0.101");
        assert_eq!(f[13], "V");
    }

    #[test]
    fn ais_sentences_carry_position_reports() {
        let s = state();

        let vdo = one(SentenceKind::Vdo, &s);
        assert!(vdo.starts_with("!AIVDO,1,1,,A,"));
        let f = fields(&vdo);
        assert_eq!(f[6], "0");
        let own = PositionReport::decode(f[5]).unwrap();
        assert_eq!(own.mmsi, 503_123_456);
        assert_eq!(own.second, 3);

        let vdm = one(SentenceKind::Vdm, &s);
        assert!(vdm.starts_with("!AIVDM,"));
        let target = PositionReport::decode(fields(&vdm)[5]).unwrap();
        assert_eq!(target.mmsi, 503_654_321);
    }

    #[test]
    fn static_reports_are_two_fragments_sharing_a_sequence_id() {
        let mut encoder = SentenceEncoder::new();
        let s = state();

        let vdo = encoder.encode_one(SentenceKind::VdoStatic, &s);
        assert_eq!(vdo.len(), 2);
        let first = fields(&vdo[0]);
        let second = fields(&vdo[1]);
        assert_eq!(&first[..5], &["AIVDO", "2", "1", "0", "A"]);
        assert_eq!(&second[..5], &["AIVDO", "2", "2", "0", "A"]);
        assert_eq!(first[5].len(), MAX_FRAGMENT_PAYLOAD);
        assert_eq!(first[6], "0");
        assert_eq!(second[6], "2");

        let payload = format!("{}{}", first[5], second[5]);
        let own = StaticVoyageReport::decode(&payload).unwrap();
        assert_eq!(own.mmsi, 503_123_456);
        assert_eq!(own.name, "NMEA SIM");

        let vdm = encoder.encode_one(SentenceKind::VdmStatic, &s);
        assert!(vdm.iter().all(|line| fields(line)[3] == "1"));
        let payload: String = vdm.iter().map(|line| fields(line)[5]).collect();
        let target = StaticVoyageReport::decode(&payload).unwrap();
        assert_eq!(target.mmsi, 503_654_321);
        assert_eq!(target.name, "PACIFIC TRADER");
    }

    #[test]
    fn sequence_id_rolls_over_after_nine() {
        let mut encoder = SentenceEncoder::new();
        let s = state();

        let ids: Vec<String> = (0..12)
            .map(|_| fields(&encoder.encode_one(SentenceKind::VdoStatic, &s)[0])[3].to_owned())
            .collect();
        assert_eq!(ids, ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "1"]);
    }

    #[test]
    fn second_engine_idles_at_the_same_pitch() {
        let s = state();
        assert_eq!(
            fields(&one(SentenceKind::Rpm, &s)),
            vec!["IIRPM", "E", "1", "1850.4", "10.5", "A"]
        );
        assert_eq!(
            fields(&one(SentenceKind::Rpm2, &s)),
            vec!["IIRPM", "E", "2", "0.0", "10.5", "A"]
        );
    }

    #[test]
    fn headings_just_short_of_north_print_as_zero() {
        let mut s = state();
        s.heading_true = 359.96;
        s.course_over_ground = 359.97;
        s.magnetic_variation = 0.0;

        assert_eq!(fields(&one(SentenceKind::Hdt, &s))[1], "0.0");
        assert_eq!(fields(&one(SentenceKind::Rmc, &s))[8], "0.0");
        let vhw = one(SentenceKind::Vhw, &s);
        assert_eq!(fields(&vhw)[1], "0.0");
        assert_eq!(fields(&vhw)[3], "0.0");
        let vtg = one(SentenceKind::Vtg, &s);
        assert_eq!(fields(&vtg)[1], "0.0");
        assert_eq!(fields(&vtg)[3], "0.0");
    }

    #[test]
    fn batch_is_crlf_terminated() {
        let batch = SentenceEncoder::new().encode_batch(&state());
        assert!(batch.ends_with("\r\n"));
        assert_eq!(batch.matches("\r\n").count(), SentenceKind::BATCH_LEN);
    }
}
