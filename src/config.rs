use std::env;
use std::time::Duration;

use crate::identity::generate_worker_id;

const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
  pub hub_host: String,
  pub hub_port: u16,
  pub worker_id: String,
  pub heartbeat_interval: Duration,
  pub reconnect_delay: Duration,
}

impl Config {
  pub fn from_env() -> Self {
    Self {
      hub_host: env::var("HUB_HOST").unwrap_or_else(|_| "localhost".into()),
      hub_port: env::var("HUB_PORT")
        .unwrap_or_else(|_| "8001".into())
        .parse()
        .unwrap_or(8001),
      worker_id: env::var("WORKER_ID").unwrap_or_else(|_| generate_worker_id()),
      heartbeat_interval: Duration::from_secs(
        env::var("HEARTBEAT_INTERVAL")
          .unwrap_or_else(|_| "30".into())
          .parse()
          .unwrap_or(30),
      ),
      reconnect_delay: Duration::from_secs(DEFAULT_RECONNECT_DELAY_SECS),
    }
  }

  /// WebSocket endpoint for this worker, deterministic from host, port and id.
  pub fn hub_url(&self) -> String {
    format!("ws://{}:{}/ws/worker/{}", self.hub_host, self.hub_port, self.worker_id)
  }
}
