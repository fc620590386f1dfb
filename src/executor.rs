use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Semaphore, mpsc};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::messages::{Message, WorkerState};

/// One unit of dispatched work. Lives only for the duration of a single
/// execution; nothing about it survives a reconnect.
#[derive(Debug, Clone)]
pub struct Job {
  pub id: String,
  pub payload: serde_json::Map<String, Value>,
}

/// The external collaborator that performs the actual work of a job.
#[async_trait]
pub trait JobHandler: Send + Sync {
  async fn run(&self, job: Job) -> Result<Value>;
}

/// Placeholder handler: waits a fixed duration, then reports success.
pub struct SimulatedJob {
  pub duration: Duration,
}

impl Default for SimulatedJob {
  fn default() -> Self {
    Self { duration: Duration::from_secs(5) }
  }
}

#[async_trait]
impl JobHandler for SimulatedJob {
  async fn run(&self, job: Job) -> Result<Value> {
    sleep(self.duration).await;
    Ok(json!({
      "status": "success",
      "output": format!("Job {} completed successfully", job.id),
    }))
  }
}

/// Runs jobs one at a time and reports their lifecycle to the hub.
///
/// Every execution is bracketed: a `busy` status goes out before the handler
/// runs and an `idle` status goes out after it finishes, on every exit path
/// including a panicking handler. Handler failures become `job_failed`
/// reports and never reach the receive loop.
#[derive(Clone)]
pub struct Executor {
  worker_id: String,
  outbound: mpsc::Sender<Message>,
  handler: Arc<dyn JobHandler>,
  gate: Arc<Semaphore>,
}

impl Executor {
  pub fn new(
    worker_id: String,
    outbound: mpsc::Sender<Message>,
    handler: Arc<dyn JobHandler>,
    gate: Arc<Semaphore>,
  ) -> Self {
    Self { worker_id, outbound, handler, gate }
  }

  /// Queue a job for execution on its own task so the receive loop is never
  /// blocked. The gate holds one permit: a second assignment waits for the
  /// running job to finish.
  pub fn spawn(&self, job: Job) {
    let executor = self.clone();
    tokio::spawn(async move {
      let Ok(_permit) = executor.gate.clone().acquire_owned().await else {
        return;
      };
      executor.execute(job).await;
    });
  }

  pub async fn execute(&self, job: Job) {
    info!(job_id = %job.id, "job accepted");
    self
      .send(Message::status(&self.worker_id, WorkerState::Busy, None, Some(job.id.clone())))
      .await;

    let job_id = job.id.clone();
    let handler = self.handler.clone();
    // Run the handler on its own task so a panic is contained as a failure.
    let outcome = tokio::spawn(async move { handler.run(job).await }).await;

    match outcome {
      Ok(Ok(result)) => {
        info!(job_id = %job_id, "job completed");
        self.send(Message::job_completed(&self.worker_id, &job_id, result)).await;
      }
      Ok(Err(e)) => {
        error!(job_id = %job_id, error = %e, "job failed");
        self.send(Message::job_failed(&self.worker_id, &job_id, e.to_string())).await;
      }
      Err(e) => {
        error!(job_id = %job_id, error = %e, "job task panicked");
        self
          .send(Message::job_failed(&self.worker_id, &job_id, format!("job task panicked: {e}")))
          .await;
      }
    }

    self.send(Message::status(&self.worker_id, WorkerState::Idle, None, None)).await;
  }

  async fn send(&self, msg: Message) {
    if self.outbound.send(msg).await.is_err() {
      warn!(worker_id = %self.worker_id, "session closed, dropping outbound message");
    }
  }
}
