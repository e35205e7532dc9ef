use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Description of a route before it is expanded into waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteSpec {
    Line {
        start: GeoPoint,
        end: GeoPoint,
        points: usize,
    },
    Circle {
        center: GeoPoint,
        radius_nm: f64,
        points: usize,
    },
    Rectangle {
        center: GeoPoint,
        width_nm: f64,
        height_nm: f64,
    },
    Waypoints {
        points: Vec<GeoPoint>,
        #[serde(default)]
        closed: bool,
    },
}

impl RouteSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            RouteSpec::Line { .. } => "line",
            RouteSpec::Circle { .. } => "circle",
            RouteSpec::Rectangle { .. } => "rectangle",
            RouteSpec::Waypoints { .. } => "waypoints",
        }
    }
}

impl Default for RouteSpec {
    /// Sydney Harbour, Opera House heading north-east.
    fn default() -> Self {
        RouteSpec::Line {
            start: GeoPoint::new(-33.8587, 151.2140),
            end: GeoPoint::new(-33.8400, 151.2200),
            points: 10,
        }
    }
}
