use std::sync::Arc;

use hive_worker::config::Config;
use hive_worker::connection::ConnectionManager;
use hive_worker::executor::SimulatedJob;
use hive_worker::identity::{Capabilities, WorkerIdentity};
use tracing::{error, info};

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt::init();
  let config = Config::from_env();
  let identity = WorkerIdentity::new(config.worker_id.clone(), Capabilities::default());

  info!(worker_id = %identity.worker_id, url = %config.hub_url(), "worker starting");

  let manager = ConnectionManager::new(config, identity, Arc::new(SimulatedJob::default()));
  tokio::select! {
    _ = tokio::signal::ctrl_c() => {
      info!("interrupt received, shutting down");
    }
    result = manager.run() => {
      if let Err(e) = result {
        error!(error = %e, "worker terminated unexpectedly");
        std::process::exit(1);
      }
    }
  }
}
