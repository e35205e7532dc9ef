mod builder;
mod spec;

pub use builder::RouteBuilder;
pub use spec::RouteSpec;

use serde::{Deserialize, Serialize};

use crate::geo::{self, GeoPoint};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RouteError {
    #[error("{kind} route needs at least {min} points, got {got}")]
    TooFewPoints {
        kind: &'static str,
        min: usize,
        got: usize,
    },
    #[error("{field} must be a positive number of nautical miles, got {value}")]
    NonPositiveDimension { field: &'static str, value: f64 },
    #[error("waypoint {index} ({point}) is outside the valid latitude/longitude range")]
    InvalidCoordinate { index: usize, point: GeoPoint },
}

/// Ordered path the vessel follows. When `closed`, the last point connects
/// back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RouteFields")]
pub struct Route {
    points: Vec<GeoPoint>,
    closed: bool,
}

/// Unchecked wire form; deserialization goes through [`Route::new`].
#[derive(Deserialize)]
struct RouteFields {
    points: Vec<GeoPoint>,
    #[serde(default)]
    closed: bool,
}

impl TryFrom<RouteFields> for Route {
    type Error = RouteError;

    fn try_from(fields: RouteFields) -> Result<Self, Self::Error> {
        Route::new(fields.points, fields.closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub index: usize,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub start_index: usize,
    pub end_index: usize,
    pub length_nm: f64,
    pub bearing: f64,
}

impl Route {
    pub fn new(points: Vec<GeoPoint>, closed: bool) -> Result<Self, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::TooFewPoints {
                kind: "waypoint",
                min: 2,
                got: points.len(),
            });
        }

        if let Some((index, point)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(RouteError::InvalidCoordinate {
                index,
                point: *point,
            });
        }

        Ok(Self { points, closed })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn leg_count(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    pub fn leg(&self, index: usize) -> Leg {
        let start_index = index % self.points.len();
        let end_index = (start_index + 1) % self.points.len();
        let start = self.points[start_index];
        let end = self.points[end_index];

        Leg {
            index,
            start,
            end,
            start_index,
            end_index,
            length_nm: geo::distance_nm(start, end),
            bearing: geo::initial_bearing(start, end),
        }
    }

    pub fn legs(&self) -> impl Iterator<Item = Leg> + '_ {
        (0..self.leg_count()).map(|i| self.leg(i))
    }

    pub fn total_length_nm(&self) -> f64 {
        self.legs().map(|leg| leg.length_nm).sum()
    }
}
