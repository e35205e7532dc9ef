use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use nmea_sim::{DEFAULT_MMSI, DEFAULT_PORT, GeoPoint, RouteSpec, ShipStatic, SimulatorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Line,
    Circle,
    Rectangle,
    Waypoints,
}

/// Flat settings file. Missing keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub speed_knots: f64,
    pub route_type: RouteType,
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_nm: f64,
    pub num_points: usize,
    pub width_nm: f64,
    pub height_nm: f64,
    pub line_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoints_file: Option<PathBuf>,
    pub closed: bool,
    pub magnetic_variation: f64,
    pub mmsi: u32,
    /// Name, call sign and voyage data sent in AIS static reports.
    pub vessel: ShipStatic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub write_timeout_ms: u64,
    pub max_clients: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: DEFAULT_PORT,
            speed_knots: 5.0,
            route_type: RouteType::Line,
            start_lat: -33.8587,
            start_lon: 151.2140,
            end_lat: -33.8400,
            end_lon: 151.2200,
            center_lat: -33.8587,
            center_lon: 151.2140,
            radius_nm: 0.5,
            num_points: 8,
            width_nm: 0.3,
            height_nm: 0.2,
            line_points: 10,
            waypoints_file: None,
            closed: false,
            magnetic_variation: 0.0,
            mmsi: DEFAULT_MMSI,
            vessel: ShipStatic::default(),
            seed: None,
            write_timeout_ms: 500,
            max_clients: 32,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WaypointFile {
    waypoints: Vec<GeoPoint>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text + "\n")
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }

    pub fn route_spec(&self) -> Result<RouteSpec> {
        let spec = match self.route_type {
            RouteType::Line => RouteSpec::Line {
                start: GeoPoint::new(self.start_lat, self.start_lon),
                end: GeoPoint::new(self.end_lat, self.end_lon),
                points: self.line_points,
            },
            RouteType::Circle => RouteSpec::Circle {
                center: GeoPoint::new(self.center_lat, self.center_lon),
                radius_nm: self.radius_nm,
                points: self.num_points,
            },
            RouteType::Rectangle => RouteSpec::Rectangle {
                center: GeoPoint::new(self.center_lat, self.center_lon),
                width_nm: self.width_nm,
                height_nm: self.height_nm,
            },
            RouteType::Waypoints => {
                let Some(path) = &self.waypoints_file else {
                    bail!("route_type \"waypoints\" needs a waypoints_file");
                };
                RouteSpec::Waypoints {
                    points: load_waypoints(path)?,
                    closed: self.closed,
                }
            }
        };
        Ok(spec)
    }

    pub fn into_simulator_config(self) -> Result<SimulatorConfig> {
        let route = self.route_spec()?;
        Ok(SimulatorConfig {
            host: self.host,
            port: self.port,
            speed_knots: self.speed_knots,
            route,
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            max_clients: self.max_clients,
            magnetic_variation: self.magnetic_variation,
            mmsi: self.mmsi,
            vessel: self.vessel,
            seed: self.seed,
            ..SimulatorConfig::default()
        })
    }
}

/// Reads `{"waypoints": [{"lat": .., "lon": ..}, ...]}`.
pub fn load_waypoints(path: &Path) -> Result<Vec<GeoPoint>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read waypoints from {}", path.display()))?;
    let file: WaypointFile = serde_json::from_str(&text)
        .with_context(|| format!("invalid waypoints file {}", path.display()))?;
    Ok(file.waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nmea-sim-{}-{}", std::process::id(), name))
    }

    #[test]
    fn partial_file_takes_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"route_type": "circle", "radius_nm": 1.5}"#).unwrap();

        assert_eq!(settings.port, 10110);
        assert_eq!(settings.num_points, 8);
        assert_eq!(
            settings.route_spec().unwrap(),
            RouteSpec::Circle {
                center: GeoPoint::new(-33.8587, 151.2140),
                radius_nm: 1.5,
                points: 8,
            }
        );
    }

    #[test]
    fn vessel_block_fills_missing_keys_from_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"vessel": {"name": "Sea Eagle", "draught": 2.1}}"#).unwrap();
        let config = settings.into_simulator_config().unwrap();

        assert_eq!(config.vessel.name, "Sea Eagle");
        assert_eq!(config.vessel.draught, 2.1);
        assert_eq!(config.vessel.call_sign, ShipStatic::default().call_sign);
    }

    #[test]
    fn reads_flat_settings_layout() {
        let json = r#"{
            "host": "127.0.0.1",
            "port": 8080,
            "speed_knots": 10.0,
            "route_type": "rectangle",
            "center_lat": -33.85,
            "center_lon": 151.21,
            "width_nm": 0.5,
            "height_nm": 0.3
        }"#;
        let config = serde_json::from_str::<Settings>(json)
            .unwrap()
            .into_simulator_config()
            .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.speed_knots, 10.0);
        assert!(matches!(config.route, RouteSpec::Rectangle { width_nm, .. } if width_nm == 0.5));
    }

    #[test]
    fn unknown_route_type_is_rejected() {
        let err = serde_json::from_str::<Settings>(r#"{"route_type": "spiral"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("settings.json");
        let settings = Settings {
            speed_knots: 7.5,
            seed: Some(42),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn waypoints_route_reads_file() {
        let path = temp_path("waypoints.json");
        fs::write(
            &path,
            r#"{"waypoints": [{"lat": -33.85, "lon": 151.21}, {"lat": -33.84, "lon": 151.22}]}"#,
        )
        .unwrap();

        let settings = Settings {
            route_type: RouteType::Waypoints,
            waypoints_file: Some(path.clone()),
            closed: true,
            ..Settings::default()
        };
        let spec = settings.route_spec();
        fs::remove_file(&path).ok();

        assert_eq!(
            spec.unwrap(),
            RouteSpec::Waypoints {
                points: vec![GeoPoint::new(-33.85, 151.21), GeoPoint::new(-33.84, 151.22)],
                closed: true,
            }
        );
    }

    #[test]
    fn waypoints_route_needs_file() {
        let settings = Settings {
            route_type: RouteType::Waypoints,
            ..Settings::default()
        };
        assert!(settings.route_spec().is_err());
    }
}
