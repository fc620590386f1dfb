use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::Capabilities;

/// Current worker availability as reported to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
  Idle,
  Busy,
}

impl std::fmt::Display for WorkerState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      WorkerState::Idle => write!(f, "idle"),
      WorkerState::Busy => write!(f, "busy"),
    }
  }
}

/// The closed set of wire messages exchanged with the hub.
///
/// Every message is a self-describing JSON object: the `type` field carries
/// the variant tag and outbound messages are stamped with the epoch-seconds
/// timestamp of emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
  WorkerStatus {
    worker_id: String,
    status: WorkerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<Capabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<String>,
    timestamp: f64,
  },
  Heartbeat {
    worker_id: String,
    timestamp: f64,
  },
  JobCompleted {
    worker_id: String,
    job_id: String,
    result: Value,
    timestamp: f64,
  },
  JobFailed {
    worker_id: String,
    job_id: String,
    error: String,
    timestamp: f64,
  },
  ConnectionEstablished {
    #[serde(default)]
    message: String,
  },
  JobAssignment {
    job_id: String,
    #[serde(flatten)]
    payload: serde_json::Map<String, Value>,
  },
  HeartbeatResponse {},
}

impl Message {
  pub fn status(
    worker_id: &str,
    status: WorkerState,
    capabilities: Option<Capabilities>,
    job_id: Option<String>,
  ) -> Self {
    Message::WorkerStatus {
      worker_id: worker_id.to_string(),
      status,
      capabilities,
      job_id,
      timestamp: epoch_now(),
    }
  }

  pub fn heartbeat(worker_id: &str) -> Self {
    Message::Heartbeat {
      worker_id: worker_id.to_string(),
      timestamp: epoch_now(),
    }
  }

  pub fn job_completed(worker_id: &str, job_id: &str, result: Value) -> Self {
    Message::JobCompleted {
      worker_id: worker_id.to_string(),
      job_id: job_id.to_string(),
      result,
      timestamp: epoch_now(),
    }
  }

  pub fn job_failed(worker_id: &str, job_id: &str, error: String) -> Self {
    Message::JobFailed {
      worker_id: worker_id.to_string(),
      job_id: job_id.to_string(),
      error,
      timestamp: epoch_now(),
    }
  }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn epoch_now() -> f64 {
  Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn worker_status_is_self_describing() {
    let msg = Message::status("worker-abcd1234", WorkerState::Idle, Some(Capabilities::default()), None);
    let encoded = serde_json::to_value(&msg).unwrap();
    assert_eq!(encoded["type"], "worker_status");
    assert_eq!(encoded["worker_id"], "worker-abcd1234");
    assert_eq!(encoded["status"], "idle");
    assert!(encoded["capabilities"].is_object());
    assert!(encoded["timestamp"].as_f64().unwrap() > 0.0);
  }

  #[test]
  fn busy_status_carries_job_id_and_idle_omits_it() {
    let busy = Message::status("w1", WorkerState::Busy, None, Some("job-42".into()));
    let encoded = serde_json::to_value(&busy).unwrap();
    assert_eq!(encoded["status"], "busy");
    assert_eq!(encoded["job_id"], "job-42");

    let idle = Message::status("w1", WorkerState::Idle, None, None);
    let encoded = serde_json::to_value(&idle).unwrap();
    assert!(encoded.get("job_id").is_none());
    assert!(encoded.get("capabilities").is_none());
  }

  #[test]
  fn heartbeat_round_trips() {
    let text = serde_json::to_string(&Message::heartbeat("w1")).unwrap();
    match serde_json::from_str::<Message>(&text).unwrap() {
      Message::Heartbeat { worker_id, timestamp } => {
        assert_eq!(worker_id, "w1");
        assert!(timestamp > 0.0);
      }
      other => panic!("unexpected variant: {:?}", other),
    }
  }

  #[test]
  fn job_assignment_keeps_extra_payload_fields() {
    let raw = json!({
      "type": "job_assignment",
      "job_id": "job-42",
      "input": {"frames": 10},
      "priority": 3
    });
    match serde_json::from_value::<Message>(raw).unwrap() {
      Message::JobAssignment { job_id, payload } => {
        assert_eq!(job_id, "job-42");
        assert_eq!(payload["input"]["frames"], 10);
        assert_eq!(payload["priority"], 3);
      }
      other => panic!("unexpected variant: {:?}", other),
    }
  }

  #[test]
  fn unknown_tag_fails_to_decode() {
    let raw = json!({"type": "shutdown_notice"});
    assert!(serde_json::from_value::<Message>(raw).is_err());
  }

  #[test]
  fn job_outcomes_serialize_with_tag() {
    let done = Message::job_completed("w1", "job-42", json!({"status": "success"}));
    let encoded = serde_json::to_value(&done).unwrap();
    assert_eq!(encoded["type"], "job_completed");
    assert_eq!(encoded["result"]["status"], "success");

    let failed = Message::job_failed("w1", "job-42", "boom".into());
    let encoded = serde_json::to_value(&failed).unwrap();
    assert_eq!(encoded["type"], "job_failed");
    assert_eq!(encoded["error"], "boom");
  }
}
