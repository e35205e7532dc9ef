use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in decimal degrees.
///
/// Serialized as `{"lat": .., "lon": ..}`, the layout waypoint files use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat", alias = "latitude")]
    pub latitude: f64,
    #[serde(rename = "lon", alias = "longitude")]
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_bounds() {
        assert!(GeoPoint::new(-33.8587, 151.2140).is_valid());
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn waypoint_file_layout() {
        let point: GeoPoint = serde_json::from_str(r#"{"lat": -33.86, "lon": 151.21}"#).unwrap();
        assert_eq!(point, GeoPoint::new(-33.86, 151.21));

        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"lat\""));
        assert!(json.contains("\"lon\""));
    }
}
