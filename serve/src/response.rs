//! Send a single `ServerResponse` as JSON over the WebSocket.

use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use vectorizer::protocol::ServerResponse;

/// Sent in place of a response that cannot be serialized.
const SERIALIZATION_ERROR: &str = r#"{"type":"error","kind":"inference_error","error":"serialization error"}"#;

pub(crate) fn encode(response: &ServerResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "response serialization failed");
        SERIALIZATION_ERROR.to_string()
    })
}

pub(crate) async fn send_response<S>(
    sink: &mut S,
    response: &ServerResponse,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    sink.send(Message::Text(encode(response))).await?;
    Ok(())
}
