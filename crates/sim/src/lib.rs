pub mod config;
pub mod geo;
pub mod nav;
pub mod net;
pub mod nmea;
pub mod route;

pub use config::{DEFAULT_MMSI, DEFAULT_PORT, DEFAULT_TICK_PERIOD, SimulatorConfig};
pub use geo::GeoPoint;
pub use nav::{Navigator, ShipStatic, VesselState};
pub use net::{
    BroadcastServer, ClientId, ClientInfo, ClientWriteError, DisconnectReason, ServerError,
    ServerEvent, ServerHandle,
};
pub use nmea::{SentenceEncoder, SentenceKind};
pub use route::{Route, RouteBuilder, RouteError, RouteSpec};
