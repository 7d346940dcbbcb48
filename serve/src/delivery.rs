//! Delivering responses to the connection writer: `ResponseSender` abstraction and
//! streamed-embedding delivery.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use vectorizer::protocol::{
    EmbeddingsPartialResponse, ItemErrorResponse, ServerResponse, StreamEndResponse,
};
use vectorizer::StreamItem;

/// Most stream items folded into one `embeddings_partial` reply.
pub(crate) const PARTIAL_CHUNK: usize = 32;

/// Abstraction for sending server responses from request handlers.
#[async_trait]
pub(crate) trait ResponseSender: Send + Sync {
    /// Queues one response. Failure means the connection is gone; the caller stops work.
    async fn send_response(
        &self,
        response: ServerResponse,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Handlers run as separate tasks and hand responses to the connection's writer task.
#[async_trait]
impl ResponseSender for mpsc::Sender<ServerResponse> {
    async fn send_response(
        &self,
        response: ServerResponse,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.send(response)
            .await
            .map_err(|_| "connection closed".into())
    }
}

/// Forwards a streamed embedding request: items that are ready together go out as one
/// `embeddings_partial`, each failed item as an `item_error`, then one `stream_end`.
///
/// A send failure drops `stream`, which aborts the remaining work.
pub(crate) async fn deliver_stream<St, S>(
    id: &str,
    stream: St,
    sender: &S,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    St: Stream<Item = StreamItem> + Unpin,
    S: ResponseSender + ?Sized,
{
    let mut chunks = stream.ready_chunks(PARTIAL_CHUNK);
    let mut delivered = 0;
    let mut failed = 0;
    while let Some(chunk) = chunks.next().await {
        let mut indices = Vec::with_capacity(chunk.len());
        let mut embeddings = Vec::with_capacity(chunk.len());
        let mut errors = Vec::new();
        for item in chunk {
            match item.result {
                Ok(v) => {
                    indices.push(item.index);
                    embeddings.push(v);
                }
                Err(e) => errors.push(ItemErrorResponse {
                    id: id.to_string(),
                    index: item.index,
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                }),
            }
        }
        if !indices.is_empty() {
            delivered += indices.len();
            sender
                .send_response(ServerResponse::EmbeddingsPartial(EmbeddingsPartialResponse {
                    id: id.to_string(),
                    indices,
                    embeddings,
                }))
                .await?;
        }
        for err in errors {
            failed += 1;
            sender.send_response(ServerResponse::ItemError(err)).await?;
        }
    }
    if failed > 0 {
        tracing::warn!(id = %id, delivered, failed, "stream finished with failed items");
    }
    sender
        .send_response(ServerResponse::StreamEnd(StreamEndResponse {
            id: id.to_string(),
            delivered,
            failed,
        }))
        .await
}
