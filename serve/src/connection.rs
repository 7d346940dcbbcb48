//! WebSocket connection lifecycle: recv loop, per-request tasks, and a single writer.
//!
//! Each request runs in its own task so several requests on one connection proceed
//! concurrently; replies go through a bounded channel to the writer task and may
//! interleave. At most [`MAX_REQUESTS_IN_FLIGHT`] requests run per connection; past that
//! the reader stops pulling messages until one finishes. Closing the connection cancels
//! the connection's token (waits for permits end with `permit_acquisition_cancelled`) and
//! aborts unfinished request tasks.

use axum::extract::ws::{Message, WebSocket};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, AcquireError, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use vectorizer::protocol::{ClientRequest, ErrorResponse, ServerResponse};
use vectorizer::EmbeddingService;

use crate::delivery::ResponseSender;
use crate::handlers::handle_request;
use crate::response::send_response;

/// Responses buffered between request tasks and the writer.
const OUTBOUND_QUEUE_CAPACITY: usize = 128;

/// Requests one connection may have running at once.
const MAX_REQUESTS_IN_FLIGHT: usize = 64;

/// Waits for a free slot, then spawns `task` holding it until the task ends.
async fn spawn_bounded<F>(
    tasks: &mut JoinSet<()>,
    slots: &Arc<Semaphore>,
    task: F,
) -> Result<(), AcquireError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let slot = slots.clone().acquire_owned().await?;
    tasks.spawn(async move {
        let _slot = slot;
        task.await;
    });
    Ok(())
}

pub(crate) async fn handle_socket(
    socket: WebSocket,
    service: Arc<EmbeddingService>,
    shutdown_tx: Option<oneshot::Sender<()>>,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerResponse>(OUTBOUND_QUEUE_CAPACITY);

    let writer = tokio::spawn(async move {
        while let Some(resp) = rx.recv().await {
            if let Err(e) = send_response(&mut sink, &resp).await {
                tracing::warn!("write error (client closed?): {}", e);
                break;
            }
        }
    });

    let cancel = CancellationToken::new();
    let slots = Arc::new(Semaphore::new(MAX_REQUESTS_IN_FLIGHT));
    let mut tasks = JoinSet::new();
    loop {
        tokio::select! {
            msg = stream.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        tracing::warn!("read error (client closed?): {}", e);
                        break;
                    }
                    None => break,
                };
                let text = match msg {
                    Message::Text(t) => t,
                    Message::Binary(b) => String::from_utf8_lossy(&b).into_owned(),
                    Message::Close(_) => break,
                    _ => continue,
                };
                let request: ClientRequest = match serde_json::from_str(&text) {
                    Ok(r) => r,
                    Err(e) => {
                        let resp = ServerResponse::Error(ErrorResponse {
                            id: None,
                            kind: None,
                            error: format!("parse error: {}", e),
                        });
                        if tx.send_response(resp).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };
                tracing::debug!(id = %request.id(), "request received");
                let service = service.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                let spawned = spawn_bounded(&mut tasks, &slots, async move {
                    let id = request.id().to_string();
                    if let Err(e) = handle_request(&service, request, &tx, &cancel).await {
                        tracing::debug!(id = %id, error = %e, "reply dropped");
                    }
                })
                .await;
                if spawned.is_err() {
                    break;
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        tracing::error!(error = %e, "request task panicked");
                    }
                }
            }
        }
    }

    cancel.cancel();
    tasks.shutdown().await;
    drop(tx);
    let _ = writer.await;

    if let Some(tx) = shutdown_tx {
        let _ = tx.send(());
    }
}
