//! # Protocol module
//!
//! WebSocket request/response types. Every message is a JSON object tagged by `"type"`
//! (snake_case) and carries the client-chosen request `id`; replies for different requests
//! on one connection may interleave.
//!
//! Model types travel as strings (e.g. `"E5_BASE_V2"`) and are parsed by the server, so an
//! unknown type produces a `not_found` error that still carries the request id. Embedding
//! requests may instead carry a raw `model_url`; when both are set, `model_url` wins.

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Requests (client → server)
// -----------------------------------------------------------------------------

/// Embed one text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedOneRequest {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

/// Embed many texts; reply is a single order-preserving list (or one error).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedManyRequest {
    pub id: String,
    pub texts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

/// Lookup request: catalog details for one model type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupModelRequest {
    pub id: String,
    pub model_type: String,
}

/// Health request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthCheckRequest {
    pub id: String,
}

/// Client-to-server request envelope.
///
/// Each variant maps to a JSON object with `"type": "<variant_name>"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    EmbedOne(EmbedOneRequest),
    EmbedMany(EmbedManyRequest),
    /// Same payload as `embed_many`; replies arrive incrementally.
    EmbedManyStream(EmbedManyRequest),
    LookupModel(LookupModelRequest),
    HealthCheck(HealthCheckRequest),
}

impl ClientRequest {
    pub fn id(&self) -> &str {
        match self {
            ClientRequest::EmbedOne(r) => &r.id,
            ClientRequest::EmbedMany(r) | ClientRequest::EmbedManyStream(r) => &r.id,
            ClientRequest::LookupModel(r) => &r.id,
            ClientRequest::HealthCheck(r) => &r.id,
        }
    }
}

// -----------------------------------------------------------------------------
// Responses (server → client)
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub id: String,
    pub embedding: Vec<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub id: String,
    pub embeddings: Vec<Vec<f32>>,
}

/// A group of streamed results. `embeddings[k]` belongs to input `indices[k]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingsPartialResponse {
    pub id: String,
    pub indices: Vec<usize>,
    pub embeddings: Vec<Vec<f32>>,
}

/// One failed input of a streamed request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemErrorResponse {
    pub id: String,
    pub index: usize,
    pub kind: String,
    pub error: String,
}

/// Final reply of a streamed request; `delivered + failed` equals the number of inputs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamEndResponse {
    pub id: String,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelDetailsResponse {
    pub id: String,
    pub model_type: String,
    pub model_name: String,
    pub url: String,
    /// Unix time, seconds, at which the reply was produced.
    pub response_time: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub id: String,
    pub status: String,
}

/// Error response for any failed request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Machine-readable category, see `EmbedError::kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub error: String,
}

/// Server-to-client response envelope.
///
/// Each variant maps to a JSON object with `"type": "<variant_name>"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerResponse {
    Embedding(EmbeddingResponse),
    Embeddings(EmbeddingsResponse),
    EmbeddingsPartial(EmbeddingsPartialResponse),
    ItemError(ItemErrorResponse),
    StreamEnd(StreamEndResponse),
    ModelDetails(ModelDetailsResponse),
    Health(HealthResponse),
    Error(ErrorResponse),
}

impl ServerResponse {
    /// Error reply from an [`EmbedError`](crate::EmbedError), keeping its kind.
    pub fn from_error(id: Option<String>, err: &crate::EmbedError) -> Self {
        ServerResponse::Error(ErrorResponse {
            id,
            kind: Some(err.kind().to_string()),
            error: err.to_string(),
        })
    }
}
