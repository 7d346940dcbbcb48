//! Shared helpers for e2e tests. Received responses are logged with `[e2e] received: ...`.
//! Run tests with `--nocapture` to see them.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use vectorizer::protocol::{ClientRequest, ServerResponse};
use vectorizer::{EmbeddingService, HashingLoader, ModelRegistry, ServiceOptions, SourceResolver};

pub const DIMENSION: usize = 8;

/// Service over the offline hashing backend; no network or model files needed.
pub async fn hashing_service() -> Arc<EmbeddingService> {
    let registry = Arc::new(ModelRegistry::new(
        SourceResolver::new(std::env::temp_dir().join("vectorizer-e2e")),
        Arc::new(HashingLoader::new(DIMENSION)),
    ));
    let mut options = ServiceOptions::new("hash://e2e-default");
    options.max_in_flight = 2;
    options.batch_size = 3;
    Arc::new(EmbeddingService::start(registry, options).await.unwrap())
}

/// Bind to a random port and spawn the server in once mode. Returns (ws_url, service, server_handle).
pub async fn spawn_server_once() -> (
    String,
    Arc<EmbeddingService>,
    tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
) {
    let service = hashing_service().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("ws://{}", addr);
    let server_handle = tokio::spawn(serve::run_serve_on_listener(listener, service.clone(), true));
    (url, service, server_handle)
}

pub async fn send<W>(
    write: &mut W,
    req: &ClientRequest,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::error::Error + Send + Sync + 'static,
{
    let json = serde_json::to_string(req)?;
    write.send(Message::Text(json)).await?;
    Ok(())
}

/// Reads the next text message. Returns the parsed response and the raw JSON so tests can
/// assert on wire content.
pub async fn recv<R>(read: &mut R) -> Result<(ServerResponse, String), Box<dyn std::error::Error + Send + Sync>>
where
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let opt = timeout(Duration::from_secs(10), read.next())
            .await
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout waiting for response")
            })?;
        let msg = opt
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no message"))??;
        if !msg.is_text() {
            continue;
        }
        let text = msg
            .to_text()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let received = text.to_string();
        eprintln!("[e2e] received: {}", received);
        let resp: ServerResponse = serde_json::from_str(text)?;
        return Ok((resp, received));
    }
}

pub async fn send_and_recv<W, R>(
    write: &mut W,
    read: &mut R,
    req: &ClientRequest,
) -> Result<(ServerResponse, String), Box<dyn std::error::Error + Send + Sync>>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::error::Error + Send + Sync + 'static,
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    send(write, req).await?;
    recv(read).await
}
