mod jitter;
mod navigator;
mod state;

pub use jitter::{Drift, jitter, jitter_angle, jitter_non_negative};
pub use navigator::{ARRIVAL_RADIUS_NM, Navigator};
pub use state::{AisVessel, Engine, GpsFix, NavStatus, ShipStatic, Steering, VesselState, Wind};
