//! WebSocket server for the embedding service (axum + ws).
//!
//! Listens on ws://127.0.0.1:8080 by default and handles `embed_one`, `embed_many`,
//! `embed_many_stream`, `lookup_model` and `health_check` (see `vectorizer::protocol`).
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`build_service`].

mod app;
mod bootstrap;
mod connection;
mod delivery;
mod handlers;
mod response;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;
use vectorizer::EmbeddingService;

use app::{router, AppState};

pub use bootstrap::{build_service, loader_for};

/// Runs the WebSocket server on an existing listener. Used by tests (bind to 127.0.0.1:0 then pass listener).
/// When `once` is true, accepts one connection, handles it, then returns.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    service: Arc<EmbeddingService>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("WebSocket server listening on ws://{}", addr);
    if once {
        info!("will exit after first connection is done (once mode, used by tests)");
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let state = Arc::new(AppState {
        shutdown_tx: Arc::new(std::sync::Mutex::new(if once {
            Some(shutdown_tx)
        } else {
            None
        })),
        service,
    });

    let app = router(state);

    if once {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await?;
        info!("connection done, exiting (once mode)");
    } else {
        axum::serve(listener, app).await?;
    }
    Ok(())
}

/// Runs the WebSocket server on `addr`.
/// When `once` is true, accepts one connection, handles it, then returns (process exits).
pub async fn run_serve(
    addr: std::net::SocketAddr,
    service: Arc<EmbeddingService>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, service, once).await
}
