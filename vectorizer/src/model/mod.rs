//! Model handles and the inference seam.
//!
//! The inference capability itself is a black box behind two traits:
//! [`ModelLoader`] turns a resolved model location into a [`Predictor`], and a
//! [`Predictor`] turns one text into one vector. [`ModelRegistry`] owns the loaded
//! predictors and hands out cheap [`ModelHandle`] clones.
//!
//! Backends: [`HashingLoader`] (offline, deterministic) and [`OpenAiLoader`]
//! (OpenAI-compatible embeddings endpoint).

mod hashing;
mod openai;
mod registry;
mod source;

pub use hashing::{HashingLoader, HashingPredictor};
pub use openai::{model_name_from_location, OpenAiLoader, OpenAiPredictor};
pub use registry::ModelRegistry;
pub use source::SourceResolver;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::EmbedError;

/// Produces one fixed-length vector per input text.
///
/// Implementations must be `Send + Sync`: one loaded predictor is shared by every
/// request that uses its model and may be called concurrently (up to the limiter capacity).
/// CPU-bound implementations should move work off the async workers themselves
/// (e.g. `tokio::task::spawn_blocking`).
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Embeds `text`. Failures are reported as [`EmbedError::Inference`].
    async fn predict(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Vector length produced by this model, when known.
    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// Loads a predictor from a resolved model location (local `file://` URI or remote URI).
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Loads the model. Any failure is reported as [`EmbedError::ModelUnavailable`].
    async fn load(&self, location: &str) -> Result<Arc<dyn Predictor>, EmbedError>;
}

/// Shared, read-only reference to a loaded model.
///
/// Cloning is cheap. Callers borrow it for an inference call and never close it;
/// the underlying predictor lives as long as the [`ModelRegistry`] that loaded it.
#[derive(Clone)]
pub struct ModelHandle {
    identifier: Arc<str>,
    location: Arc<str>,
    predictor: Arc<dyn Predictor>,
}

impl ModelHandle {
    pub fn new(identifier: &str, location: &str, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            identifier: Arc::from(identifier),
            location: Arc::from(location),
            predictor,
        }
    }

    /// Identifier the model was requested under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Location the identifier resolved to (after staging).
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn dimension(&self) -> Option<usize> {
        self.predictor.dimension()
    }

    /// Runs one inference call on the shared predictor.
    pub async fn predict(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.predictor.predict(text).await
    }

    /// True when both handles share the same loaded predictor.
    pub fn same_model(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.predictor, &other.predictor)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("identifier", &self.identifier)
            .field("location", &self.location)
            .field("dimension", &self.dimension())
            .finish()
    }
}
