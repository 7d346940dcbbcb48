//! Axum app: state, router, and WebSocket upgrade handler.
//!
//! Single route: `GET /` upgrades to WebSocket; each connection is handled by [`handle_socket`]
//! with the shared embedding service.

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use vectorizer::EmbeddingService;

use super::connection::handle_socket;

/// Shared state for the WebSocket server.
#[derive(Clone)]
pub(crate) struct AppState {
    /// When set, the first WebSocket connection to close will send on this to signal server exit (once mode).
    pub(crate) shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    /// One service for every connection; its limiter bounds inference across all of them.
    pub(crate) service: Arc<EmbeddingService>,
}

/// Builds the Axum router with a single WebSocket route at `/`.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}

/// Handles `GET /`: upgrades to WebSocket and delegates to [`handle_socket`].
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let shutdown_tx = state.shutdown_tx.lock().ok().and_then(|mut g| g.take());
    let service = state.service.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, service, shutdown_tx))
}
