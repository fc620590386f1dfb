use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::executor::{Executor, Job};
use crate::messages::Message;

/// Routes inbound frames by their `type` tag.
///
/// Decode failures never terminate the session: a payload that is not JSON
/// is logged and dropped, and a JSON object with an unrecognized tag is
/// logged at warn and ignored.
pub struct Dispatcher {
  executor: Executor,
}

impl Dispatcher {
  pub fn new(executor: Executor) -> Self {
    Self { executor }
  }

  pub fn dispatch(&self, raw: &str) {
    let value: Value = match serde_json::from_str(raw) {
      Ok(value) => value,
      Err(e) => {
        error!(payload = raw, error = %e, "dropping undecodable message");
        return;
      }
    };
    let tag = value.get("type").and_then(Value::as_str).unwrap_or("<missing>").to_string();

    match serde_json::from_value::<Message>(value) {
      Ok(Message::ConnectionEstablished { message }) => {
        info!(message = %message, "connection established");
      }
      Ok(Message::JobAssignment { job_id, mut payload }) => {
        payload.remove("type");
        self.executor.spawn(Job { id: job_id, payload });
      }
      Ok(Message::HeartbeatResponse {}) => {
        debug!("heartbeat acknowledged");
      }
      Ok(_) => {
        warn!(message_type = %tag, "ignoring message kind not expected from the hub");
      }
      Err(_) => {
        warn!(message_type = %tag, "ignoring unknown message type");
      }
    }
  }
}
