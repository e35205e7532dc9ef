use crate::geo::{self, GeoPoint};

use super::{Route, RouteError, RouteSpec};

pub const MIN_LINE_POINTS: usize = 2;
pub const MIN_CIRCLE_POINTS: usize = 3;

pub struct RouteBuilder;

impl RouteBuilder {
    pub fn build(spec: &RouteSpec) -> Result<Route, RouteError> {
        match spec {
            RouteSpec::Line { start, end, points } => Self::line(*start, *end, *points),
            RouteSpec::Circle {
                center,
                radius_nm,
                points,
            } => Self::circle(*center, *radius_nm, *points),
            RouteSpec::Rectangle {
                center,
                width_nm,
                height_nm,
            } => Self::rectangle(*center, *width_nm, *height_nm),
            RouteSpec::Waypoints { points, closed } => Route::new(points.clone(), *closed),
        }
    }

    pub fn line(start: GeoPoint, end: GeoPoint, points: usize) -> Result<Route, RouteError> {
        require_points("line", MIN_LINE_POINTS, points)?;

        let bearing = geo::initial_bearing(start, end);
        let distance = geo::distance_nm(start, end);
        let last = points - 1;

        let waypoints = (0..points)
            .map(|i| {
                if i == last {
                    end
                } else {
                    geo::destination(start, bearing, distance * i as f64 / last as f64)
                }
            })
            .collect();

        Route::new(waypoints, false)
    }

    pub fn circle(center: GeoPoint, radius_nm: f64, points: usize) -> Result<Route, RouteError> {
        require_points("circle", MIN_CIRCLE_POINTS, points)?;
        require_positive("radius_nm", radius_nm)?;

        let waypoints = (0..points)
            .map(|i| geo::destination(center, 360.0 * i as f64 / points as f64, radius_nm))
            .collect();

        Route::new(waypoints, true)
    }

    /// Corners ordered clockwise starting at the north-west corner.
    pub fn rectangle(center: GeoPoint, width_nm: f64, height_nm: f64) -> Result<Route, RouteError> {
        require_positive("width_nm", width_nm)?;
        require_positive("height_nm", height_nm)?;

        let north = geo::destination(center, 0.0, height_nm / 2.0).latitude;
        let south = geo::destination(center, 180.0, height_nm / 2.0).latitude;
        let east = geo::destination(center, 90.0, width_nm / 2.0).longitude;
        let west = geo::destination(center, 270.0, width_nm / 2.0).longitude;

        Route::new(
            vec![
                GeoPoint::new(north, west),
                GeoPoint::new(north, east),
                GeoPoint::new(south, east),
                GeoPoint::new(south, west),
            ],
            true,
        )
    }
}

fn require_points(kind: &'static str, min: usize, got: usize) -> Result<(), RouteError> {
    if got < min {
        return Err(RouteError::TooFewPoints { kind, min, got });
    }
    Ok(())
}

fn require_positive(field: &'static str, value: f64) -> Result<(), RouteError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(RouteError::NonPositiveDimension { field, value });
    }
    Ok(())
}
