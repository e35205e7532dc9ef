use chrono::{DateTime, Utc};

/// Fractional digits of the minutes part in `DDMM.mmmm`.
pub const MINUTE_DECIMALS: usize = 4;
const MINUTE_SCALE: u64 = 10_000;

pub const KNOTS_TO_KMH: f64 = 1.852;
pub const KNOTS_TO_MS: f64 = 0.514444;
pub const METRES_TO_FEET: f64 = 3.28084;
pub const METRES_TO_FATHOMS: f64 = 0.546807;

/// `DDMM.mmmm` and `N`/`S`.
pub fn latitude(degrees: f64) -> (String, char) {
    let hemisphere = if degrees < 0.0 { 'S' } else { 'N' };
    (degrees_minutes(degrees, 2), hemisphere)
}

/// `DDDMM.mmmm` and `E`/`W`.
pub fn longitude(degrees: f64) -> (String, char) {
    let hemisphere = if degrees < 0.0 { 'W' } else { 'E' };
    (degrees_minutes(degrees, 3), hemisphere)
}

fn degrees_minutes(value: f64, degree_width: usize) -> String {
    // Round once on the total so 59.99999' carries into the degrees.
    let total = (value.abs() * 60.0 * MINUTE_SCALE as f64).round() as u64;
    let per_degree = 60 * MINUTE_SCALE;

    let degrees = total / per_degree;
    let minutes = (total % per_degree) / MINUTE_SCALE;
    let fraction = total % MINUTE_SCALE;

    format!(
        "{:0dw$}{:02}.{:0fw$}",
        degrees,
        minutes,
        fraction,
        dw = degree_width,
        fw = MINUTE_DECIMALS
    )
}

pub fn parse_latitude(field: &str, hemisphere: &str) -> Option<f64> {
    parse_coordinate(field, hemisphere, 2, "N", "S")
}

pub fn parse_longitude(field: &str, hemisphere: &str) -> Option<f64> {
    parse_coordinate(field, hemisphere, 3, "E", "W")
}

fn parse_coordinate(
    field: &str,
    hemisphere: &str,
    degree_width: usize,
    positive: &str,
    negative: &str,
) -> Option<f64> {
    let degrees: f64 = field.get(..degree_width)?.parse().ok()?;
    let minutes: f64 = field.get(degree_width..)?.parse().ok()?;
    if !(0.0..60.0).contains(&minutes) {
        return None;
    }

    let value = degrees + minutes / 60.0;
    if hemisphere == positive {
        Some(value)
    } else if hemisphere == negative {
        Some(-value)
    } else {
        None
    }
}

/// `HHMMSS.sss`
pub fn time(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%H%M%S%.3f").to_string()
}

/// `DDMMYY`
pub fn date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%d%m%y").to_string()
}

/// Magnitude and `E`/`W` for a signed east-positive angle.
pub fn east_west(value: f64) -> (f64, char) {
    if value < 0.0 {
        (-value, 'W')
    } else {
        (value, 'E')
    }
}

pub fn status(valid: bool) -> char {
    if valid { 'A' } else { 'V' }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sydney_latitude() {
        let (value, hemisphere) = latitude(-33.8587);
        assert_eq!(value, "3351.5220");
        assert_eq!(hemisphere, 'S');
    }

    #[test]
    fn longitude_pads_three_degree_digits() {
        assert_eq!(longitude(151.2140), ("15112.8400".to_string(), 'E'));
        assert_eq!(longitude(-4.5), ("00430.0000".to_string(), 'W'));
    }

    #[test]
    fn rounding_carries_into_degrees() {
        let (value, _) = latitude(10.0 - 1e-9);
        assert_eq!(value, "1000.0000");
    }

    #[test]
    fn round_trip_within_precision() {
        let precision = 0.5 / (60.0 * MINUTE_SCALE as f64) + 1e-12;
        for &(lat, lon) in &[
            (-33.8587, 151.2140),
            (0.0, 0.0),
            (89.99999, -179.99999),
            (-0.000_01, 0.000_01),
            (51.477_928, -0.001_545),
        ] {
            let (lat_field, ns) = latitude(lat);
            let (lon_field, ew) = longitude(lon);

            let lat_back = parse_latitude(&lat_field, &ns.to_string()).unwrap();
            let lon_back = parse_longitude(&lon_field, &ew.to_string()).unwrap();

            // A value that rounds to zero loses its sign, and zero has no sign to lose.
            assert!((lat_back.abs() - lat.abs()).abs() <= precision, "{} -> {}", lat, lat_back);
            assert!((lon_back.abs() - lon.abs()).abs() <= precision, "{} -> {}", lon, lon_back);
            if lat_back != 0.0 {
                assert_eq!(lat_back.signum(), lat.signum());
            }
            if lon_back != 0.0 {
                assert_eq!(lon_back.signum(), lon.signum());
            }
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_latitude("3351.5220", "E"), None);
        assert_eq!(parse_latitude("33", "N"), None);
        assert_eq!(parse_latitude("3375.0000", "N"), None);
        assert_eq!(parse_longitude("abc12.0000", "E"), None);
    }

    #[test]
    fn time_and_date() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(time(&ts), "070503.042");
        assert_eq!(date(&ts), "090324");
    }
}
