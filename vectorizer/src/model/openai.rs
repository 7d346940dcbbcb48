//! OpenAI-compatible embeddings backend.
//!
//! Serves catalog models through any endpoint speaking the OpenAI Embeddings API
//! (a hosted API or a local embedding server). The model name sent upstream is the last
//! path segment of the model location, so
//! `djl://ai.djl.huggingface.pytorch/sentence-transformers/e5-base-v2` becomes `e5-base-v2`.

use async_openai::{
    config::OpenAIConfig,
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{ModelLoader, Predictor};
use crate::error::EmbedError;

const CHECK_TEXT: &str = "ping";

/// Upstream model name for a model location: last path segment, without a `.zip` suffix.
pub fn model_name_from_location(location: &str) -> &str {
    let trimmed = location.trim().trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.strip_suffix(".zip").unwrap_or(last)
}

/// Loads [`OpenAiPredictor`]s; loading calls the endpoint once to verify the model and learn
/// its dimension.
#[derive(Clone, Debug)]
pub struct OpenAiLoader {
    config: OpenAIConfig,
}

impl OpenAiLoader {
    /// Uses the async-openai defaults (`OPENAI_API_KEY`, api.openai.com).
    pub fn new() -> Self {
        Self {
            config: OpenAIConfig::new(),
        }
    }

    /// Custom configuration, e.g. a local server base URL.
    pub fn with_config(config: OpenAIConfig) -> Self {
        Self { config }
    }

    /// Defaults with a different base URL, e.g. `http://localhost:11434/v1`.
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_base(api_base))
    }
}

impl Default for OpenAiLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelLoader for OpenAiLoader {
    async fn load(&self, location: &str) -> Result<Arc<dyn Predictor>, EmbedError> {
        let model = model_name_from_location(location);
        if model.is_empty() {
            return Err(EmbedError::unavailable(location, "no model name in location"));
        }
        let client = Client::with_config(self.config.clone());
        let check = request_embedding(&client, model, CHECK_TEXT)
            .await
            .map_err(|e| EmbedError::unavailable(location, e))?;
        debug!(model, dimension = check.len(), "embedding endpoint check ok");
        Ok(Arc::new(OpenAiPredictor {
            client,
            model: model.to_string(),
            dimension: check.len(),
        }))
    }
}

/// One model served by an OpenAI-compatible endpoint.
pub struct OpenAiPredictor {
    client: Client<OpenAIConfig>,
    model: String,
    dimension: usize,
}

impl OpenAiPredictor {
    pub fn model(&self) -> &str {
        &self.model
    }
}

async fn request_embedding(
    client: &Client<OpenAIConfig>,
    model: &str,
    text: &str,
) -> Result<Vec<f32>, String> {
    let request = CreateEmbeddingRequest {
        input: EmbeddingInput::String(text.to_string()),
        model: model.to_string(),
        ..Default::default()
    };
    let response = client
        .embeddings()
        .create(request)
        .await
        .map_err(|e| format!("embeddings API error: {}", e))?;
    response
        .data
        .into_iter()
        .next()
        .map(|e| e.embedding)
        .ok_or_else(|| "no embedding returned".to_string())
}

#[async_trait]
impl Predictor for OpenAiPredictor {
    async fn predict(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        request_embedding(&self.client, &self.model, text)
            .await
            .map_err(EmbedError::Inference)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
