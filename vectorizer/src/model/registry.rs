//! Lazily-populated cache of loaded models, keyed by source identifier.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{ModelHandle, ModelLoader, SourceResolver};
use crate::error::EmbedError;

/// Owns every loaded model for the lifetime of the process.
///
/// Each identifier maps to a single-initialization cell: concurrent first requests for
/// the same identifier run exactly one load and all receive the same [`ModelHandle`].
/// A failed load leaves the cell empty, so the next request retries. Loaded models are
/// never evicted.
pub struct ModelRegistry {
    resolver: SourceResolver,
    loader: Arc<dyn ModelLoader>,
    models: DashMap<String, Arc<OnceCell<ModelHandle>>>,
}

impl ModelRegistry {
    pub fn new(resolver: SourceResolver, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            resolver,
            loader,
            models: DashMap::new(),
        }
    }

    /// Returns the model for `identifier`, loading it on first use.
    ///
    /// Fails with [`EmbedError::ModelUnavailable`] when the source cannot be resolved or
    /// the loader rejects it.
    pub async fn get(&self, identifier: &str) -> Result<ModelHandle, EmbedError> {
        // Clone the cell out so no map shard lock is held across the load.
        let cell = self
            .models
            .entry(identifier.to_string())
            .or_default()
            .value()
            .clone();
        let handle = cell.get_or_try_init(|| self.load(identifier)).await?;
        Ok(handle.clone())
    }

    async fn load(&self, identifier: &str) -> Result<ModelHandle, EmbedError> {
        info!(model = %identifier, "loading model");
        let result = async {
            let location = self.resolver.resolve(identifier).await?;
            let predictor = self.loader.load(&location).await?;
            Ok::<_, EmbedError>(ModelHandle::new(identifier, &location, predictor))
        }
        .await;
        match &result {
            Ok(handle) => info!(
                model = %identifier,
                location = %handle.location(),
                dimension = ?handle.dimension(),
                "model loaded"
            ),
            Err(e) => warn!(model = %identifier, error = %e, "model load failed"),
        }
        result
    }

    /// True when `identifier` has been loaded successfully.
    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.models
            .get(identifier)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    /// Identifiers of all successfully loaded models (unordered).
    pub fn loaded(&self) -> Vec<String> {
        self.models
            .iter()
            .filter(|e| e.value().initialized())
            .map(|e| e.key().clone())
            .collect()
    }
}
