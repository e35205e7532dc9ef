mod math;
mod point;

pub use math::{
    EARTH_RADIUS_NM, cross_track_nm, destination, distance_nm, initial_bearing,
    normalize_degrees,
};
pub use point::GeoPoint;
