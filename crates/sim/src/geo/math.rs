use super::GeoPoint;

/// Mean earth radius.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn normalize_longitude(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && degrees > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Haversine great-circle distance.
pub fn distance_nm(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_NM * c
}

/// Initial bearing from `a` toward `b` in `[0, 360)`. Identical points give 0.
pub fn initial_bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

pub fn destination(origin: GeoPoint, bearing_deg: f64, distance_nm: f64) -> GeoPoint {
    if distance_nm == 0.0 {
        return origin;
    }

    let delta = distance_nm / EARTH_RADIUS_NM;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let sin_lat2 = lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * sin_lat2);

    GeoPoint::new(lat2.to_degrees(), normalize_longitude(lon2.to_degrees()))
}

/// Signed distance of `point` from the great circle through `start` and `end`.
/// Positive when the point lies to the right of the track.
pub fn cross_track_nm(start: GeoPoint, end: GeoPoint, point: GeoPoint) -> f64 {
    let d13 = distance_nm(start, point) / EARTH_RADIUS_NM;
    let theta13 = initial_bearing(start, point).to_radians();
    let theta12 = initial_bearing(start, end).to_radians();

    let sin_xt = (d13.sin() * (theta13 - theta12).sin()).clamp(-1.0, 1.0);
    sin_xt.asin() * EARTH_RADIUS_NM
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYDNEY: GeoPoint = GeoPoint::new(-33.8587, 151.2140);

    #[test]
    fn one_minute_of_latitude_is_one_mile() {
        let north = GeoPoint::new(SYDNEY.latitude + 1.0 / 60.0, SYDNEY.longitude);
        let d = distance_nm(SYDNEY, north);
        assert!((d - 1.0).abs() < 0.001, "got {}", d);
    }

    #[test]
    fn cardinal_bearings() {
        let north = GeoPoint::new(1.0, 0.0);
        let east = GeoPoint::new(0.0, 1.0);
        let south = GeoPoint::new(-1.0, 0.0);
        let west = GeoPoint::new(0.0, -1.0);
        let origin = GeoPoint::new(0.0, 0.0);

        assert!(initial_bearing(origin, north).abs() < 1e-9);
        assert!((initial_bearing(origin, east) - 90.0).abs() < 1e-9);
        assert!((initial_bearing(origin, south) - 180.0).abs() < 1e-9);
        assert!((initial_bearing(origin, west) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn identical_points_have_zero_bearing() {
        assert_eq!(initial_bearing(SYDNEY, SYDNEY), 0.0);
        assert_eq!(distance_nm(SYDNEY, SYDNEY), 0.0);
    }

    #[test]
    fn destination_inverts_distance_and_bearing() {
        let target = GeoPoint::new(-33.8400, 151.2200);
        let bearing = initial_bearing(SYDNEY, target);
        let distance = distance_nm(SYDNEY, target);

        let reached = destination(SYDNEY, bearing, distance);
        assert!((reached.latitude - target.latitude).abs() < 1e-9);
        assert!((reached.longitude - target.longitude).abs() < 1e-9);
    }

    #[test]
    fn destination_wraps_antimeridian() {
        let start = GeoPoint::new(0.0, 179.9);
        let east = destination(start, 90.0, 60.0);
        assert!(east.longitude < -179.0 && east.longitude > -180.0);
    }

    #[test]
    fn cross_track_sign() {
        let start = GeoPoint::new(0.0, 0.0);
        let end = GeoPoint::new(1.0, 0.0);

        let right = GeoPoint::new(0.5, 0.01);
        let left = GeoPoint::new(0.5, -0.01);
        let on_track = GeoPoint::new(0.5, 0.0);

        assert!(cross_track_nm(start, end, right) > 0.5);
        assert!(cross_track_nm(start, end, left) < -0.5);
        assert!(cross_track_nm(start, end, on_track).abs() < 1e-9);
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert!((normalize_degrees(359.5) - 359.5).abs() < 1e-12);
    }
}
