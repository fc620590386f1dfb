use std::sync::Arc;

use anyhow::{Result, anyhow};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::executor::{Executor, JobHandler};
use crate::heartbeat::HeartbeatSender;
use crate::identity::WorkerIdentity;
use crate::messages::{Message, WorkerState};

const OUTBOUND_QUEUE_DEPTH: usize = 64;

type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Owns the connection to the hub for the life of the process.
///
/// Each successful connect produces a fresh session: initial idle status,
/// a writer task draining the outbound queue, a heartbeat task, and the
/// receive loop. Any session failure tears everything down and the manager
/// retries at a fixed delay, forever.
pub struct ConnectionManager {
  config: Config,
  identity: WorkerIdentity,
  handler: Arc<dyn JobHandler>,
  // One permit: a single job in flight at a time, across reconnects too.
  job_gate: Arc<Semaphore>,
}

impl ConnectionManager {
  pub fn new(config: Config, identity: WorkerIdentity, handler: Arc<dyn JobHandler>) -> Self {
    Self { config, identity, handler, job_gate: Arc::new(Semaphore::new(1)) }
  }

  /// Connect-and-serve loop; never returns under normal operation.
  pub async fn run(self) -> Result<()> {
    let url = self.config.hub_url();
    info!(url = %url, worker_id = %self.identity.worker_id, "connecting to hub");
    loop {
      let (stream, _) = Retry::spawn(FixedInterval::new(self.config.reconnect_delay), || async {
        connect_async(url.as_str()).await.map_err(|e| {
          warn!(error = %e, "failed to connect to hub, retrying");
          e
        })
      })
      .await?;

      info!(worker_id = %self.identity.worker_id, "connected to hub");
      if let Err(e) = self.run_session(stream).await {
        warn!(error = %e, "session ended");
      }

      tokio::time::sleep(self.config.reconnect_delay).await;
    }
  }

  async fn run_session(&self, stream: Transport) -> Result<()> {
    let (mut sink, mut inbound) = stream.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_DEPTH);

    // Sole owner of the sink; messages go out in queue order, one complete
    // frame per message.
    let writer_id = self.identity.worker_id.clone();
    let writer = tokio::spawn(async move {
      while let Some(msg) = rx.recv().await {
        let text = match serde_json::to_string(&msg) {
          Ok(text) => text,
          Err(e) => {
            error!(error = %e, "failed to encode outbound message");
            continue;
          }
        };
        if let Err(e) = sink.send(WsMessage::Text(text)).await {
          warn!(worker_id = %writer_id, error = %e, "outbound send failed");
          break;
        }
      }
    });

    tx.send(Message::status(
      &self.identity.worker_id,
      WorkerState::Idle,
      Some(self.identity.capabilities.clone()),
      None,
    ))
    .await
    .map_err(|_| anyhow!("session writer closed before initial status"))?;

    let cancel = CancellationToken::new();
    let mut heartbeat = tokio::spawn(
      HeartbeatSender::new(self.identity.worker_id.clone(), self.config.heartbeat_interval)
        .run(tx.clone(), cancel.clone()),
    );

    let executor = Executor::new(
      self.identity.worker_id.clone(),
      tx.clone(),
      self.handler.clone(),
      self.job_gate.clone(),
    );
    let dispatcher = Dispatcher::new(executor);

    let mut heartbeat_done = false;
    let result = loop {
      tokio::select! {
        frame = inbound.next() => match frame {
          Some(Ok(WsMessage::Text(text))) => dispatcher.dispatch(&text),
          Some(Ok(WsMessage::Close(_))) | None => break Ok(()),
          Some(Ok(_)) => {}
          Some(Err(e)) => break Err(anyhow!(e)),
        },
        _ = &mut heartbeat, if !heartbeat_done => {
          heartbeat_done = true;
          break Err(anyhow!("heartbeat task terminated"));
        }
      }
    };

    // Teardown: stop the heartbeat before discarding the session so no
    // heartbeat send races the close.
    cancel.cancel();
    if !heartbeat_done {
      let _ = heartbeat.await;
    }
    drop(tx);
    writer.abort();

    result
  }
}
