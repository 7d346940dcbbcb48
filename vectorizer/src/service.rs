//! Public embedding operations: single text, batch (wait-for-all), and streaming.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::ModelType;
use crate::dispatch::{BatchDispatcher, EmbeddingStream, DEFAULT_BATCH_SIZE, DEFAULT_STREAM_BUFFER};
use crate::error::EmbedError;
use crate::limiter::ConcurrencyLimiter;
use crate::model::{ModelHandle, ModelRegistry};

/// Status text returned by [`EmbeddingService::health_check`].
pub const HEALTH_STATUS: &str = "EmbeddingService is running";

/// Default limiter capacity.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

/// Construction parameters, read once at startup.
#[derive(Clone, Debug)]
pub struct ServiceOptions {
    /// Source identifier of the default model; loaded eagerly by [`EmbeddingService::start`].
    pub default_model: String,
    /// Maximum number of inference calls in flight.
    pub max_in_flight: usize,
    /// Partition size for batch and streaming requests.
    pub batch_size: usize,
    /// Channel capacity between partition workers and a streaming consumer.
    pub stream_buffer: usize,
}

impl ServiceOptions {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            batch_size: DEFAULT_BATCH_SIZE,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

/// A non-default model named by a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSource {
    /// Catalog model type, loaded from its catalog source URI.
    Catalog(ModelType),
    /// Raw source identifier: a model URL, a `file://` URI or a local `.zip` path.
    Url(String),
}

impl ModelSource {
    /// Registry key for this source.
    pub fn identifier(&self) -> &str {
        match self {
            ModelSource::Catalog(t) => t.descriptor().source_uri,
            ModelSource::Url(url) => url,
        }
    }
}

/// Per-request options.
#[derive(Clone, Debug, Default)]
pub struct EmbedOptions {
    /// Model to use instead of the default model.
    pub model: Option<ModelSource>,
    /// Cancels waits for capacity. Defaults to a token that is never cancelled.
    pub cancel: CancellationToken,
}

impl EmbedOptions {
    pub fn with_model(mut self, model: ModelType) -> Self {
        self.model = Some(ModelSource::Catalog(model));
        self
    }

    /// Uses the model at `url`, loaded on first use and shared afterwards like any other.
    pub fn with_model_url(mut self, url: impl Into<String>) -> Self {
        self.model = Some(ModelSource::Url(url.into()));
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// The embedding service: owns the limiter and dispatcher and borrows models from the
/// shared [`ModelRegistry`].
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct EmbeddingService {
    registry: Arc<ModelRegistry>,
    limiter: ConcurrencyLimiter,
    dispatcher: BatchDispatcher,
    default_model: ModelHandle,
}

/// One inference call under a permit. The permit is released when this returns, on every path.
async fn embed_with_permit(
    limiter: ConcurrencyLimiter,
    model: ModelHandle,
    cancel: CancellationToken,
    text: String,
) -> Result<Vec<f32>, EmbedError> {
    let _permit = limiter.acquire(&cancel).await?;
    debug!(model = %model.identifier(), chars = text.len(), "embedding text");
    model.predict(&text).await
}

impl EmbeddingService {
    /// Loads the default model and builds the service.
    ///
    /// A failure to load the default model is returned and the service is not created;
    /// callers must not accept traffic in that case.
    pub async fn start(
        registry: Arc<ModelRegistry>,
        options: ServiceOptions,
    ) -> Result<Self, EmbedError> {
        let default_model = registry.get(&options.default_model).await?;
        info!(
            model = %options.default_model,
            max_in_flight = options.max_in_flight,
            batch_size = options.batch_size,
            "embedding service ready"
        );
        Ok(Self {
            registry,
            limiter: ConcurrencyLimiter::new(options.max_in_flight),
            dispatcher: BatchDispatcher::new(options.batch_size, options.stream_buffer),
            default_model,
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn default_model(&self) -> &ModelHandle {
        &self.default_model
    }

    /// The default model, or the requested model loaded on demand.
    async fn model_for(&self, model: Option<&ModelSource>) -> Result<ModelHandle, EmbedError> {
        match model {
            None => Ok(self.default_model.clone()),
            Some(source) => self.registry.get(source.identifier()).await,
        }
    }

    /// Embeds one text with the default model.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_one_with(text, &EmbedOptions::default()).await
    }

    pub async fn embed_one_with(
        &self,
        text: &str,
        options: &EmbedOptions,
    ) -> Result<Vec<f32>, EmbedError> {
        let model = self.model_for(options.model.as_ref()).await?;
        embed_with_permit(
            self.limiter.clone(),
            model,
            options.cancel.clone(),
            text.to_string(),
        )
        .await
    }

    /// Embeds every text; entry `i` of the result is the embedding of `texts[i]`.
    /// Any single failure fails the whole call.
    pub async fn embed_many(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.embed_many_with(texts, &EmbedOptions::default()).await
    }

    pub async fn embed_many_with(
        &self,
        texts: Vec<String>,
        options: &EmbedOptions,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model_for(options.model.as_ref()).await?;
        let limiter = self.limiter.clone();
        let cancel = options.cancel.clone();
        self.dispatcher
            .dispatch(texts, move |text| {
                embed_with_permit(limiter.clone(), model.clone(), cancel.clone(), text)
            })
            .await
    }

    /// Embeds every text, yielding `(index, result)` items as they complete.
    ///
    /// The stream yields exactly one item per input; a failed item does not stop the others.
    /// Model resolution happens up front, so an unknown or unloadable model fails the call
    /// before any item is produced. Empty input yields an empty stream without touching
    /// the model, matching [`Self::embed_many_with`].
    pub async fn embed_many_streaming(
        &self,
        texts: Vec<String>,
    ) -> Result<EmbeddingStream, EmbedError> {
        self.embed_many_streaming_with(texts, &EmbedOptions::default())
            .await
    }

    pub async fn embed_many_streaming_with(
        &self,
        texts: Vec<String>,
        options: &EmbedOptions,
    ) -> Result<EmbeddingStream, EmbedError> {
        if texts.is_empty() {
            return Ok(EmbeddingStream::empty());
        }
        let model = self.model_for(options.model.as_ref()).await?;
        let limiter = self.limiter.clone();
        let cancel = options.cancel.clone();
        Ok(self.dispatcher.dispatch_streaming(texts, move |text| {
            embed_with_permit(limiter.clone(), model.clone(), cancel.clone(), text)
        }))
    }

    /// Liveness signal.
    pub fn health_check(&self) -> &'static str {
        HEALTH_STATUS
    }
}
