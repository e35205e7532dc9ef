use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::nav::ShipStatic;
use crate::route::RouteSpec;

pub const DEFAULT_PORT: u16 = 10110;
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_MMSI: u32 = 503_123_456;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub host: String,
    pub port: u16,
    pub speed_knots: f64,
    pub route: RouteSpec,
    pub tick_period: Duration,
    pub write_timeout: Duration,
    /// Batches a client may fall behind before it is dropped.
    pub client_queue_depth: usize,
    pub max_clients: usize,
    pub magnetic_variation: f64,
    pub mmsi: u32,
    /// Own-ship identity for AIS static reports.
    pub vessel: ShipStatic,
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: DEFAULT_PORT,
            speed_knots: 5.0,
            route: RouteSpec::default(),
            tick_period: DEFAULT_TICK_PERIOD,
            write_timeout: Duration::from_millis(500),
            client_queue_depth: 4,
            max_clients: 32,
            magnetic_variation: 0.0,
            mmsi: DEFAULT_MMSI,
            vessel: ShipStatic::default(),
            seed: None,
        }
    }
}
