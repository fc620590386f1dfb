use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::messages::Message;

/// Periodic liveness emitter for one session.
///
/// Sends a heartbeat immediately on session start and then once per interval.
/// Terminates on its own when the outbound channel closes, which the
/// connection manager treats as "session over". Cancellation stops the loop
/// without sending anything further.
pub struct HeartbeatSender {
  worker_id: String,
  interval: Duration,
}

impl HeartbeatSender {
  pub fn new(worker_id: String, interval: Duration) -> Self {
    Self { worker_id, interval }
  }

  pub async fn run(self, outbound: mpsc::Sender<Message>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(self.interval);
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          debug!(worker_id = %self.worker_id, "heartbeat cancelled");
          break;
        }
        _ = ticker.tick() => {
          if outbound.send(Message::heartbeat(&self.worker_id)).await.is_err() {
            debug!(worker_id = %self.worker_id, "outbound channel closed, stopping heartbeat");
            break;
          }
        }
      }
    }
  }
}
