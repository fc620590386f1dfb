use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static attributes the worker advertises on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
  pub gpu: bool,
  pub cpu: bool,
  pub memory: String,
  pub version: String,
}

impl Default for Capabilities {
  fn default() -> Self {
    Self {
      gpu: true,
      cpu: true,
      memory: "16GB".into(),
      version: env!("CARGO_PKG_VERSION").into(),
    }
  }
}

/// Immutable per-process identity; created once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct WorkerIdentity {
  pub worker_id: String,
  pub capabilities: Capabilities,
}

impl WorkerIdentity {
  pub fn new(worker_id: String, capabilities: Capabilities) -> Self {
    Self { worker_id, capabilities }
  }
}

/// Generate a unique worker id of the form `worker-<8 hex chars>`.
pub fn generate_worker_id() -> String {
  let uuid = Uuid::new_v4().simple().to_string();
  format!("worker-{}", &uuid[..8])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_id_has_worker_prefix() {
    let id = generate_worker_id();
    assert!(id.starts_with("worker-"));
    assert_eq!(id.len(), "worker-".len() + 8);
  }

  #[test]
  fn generated_ids_are_unique() {
    assert_ne!(generate_worker_id(), generate_worker_id());
  }

  #[test]
  fn default_capabilities_report_crate_version() {
    let caps = Capabilities::default();
    assert_eq!(caps.version, env!("CARGO_PKG_VERSION"));
    assert!(caps.cpu);
  }
}
