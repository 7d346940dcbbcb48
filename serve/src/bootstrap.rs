//! Builds the embedding service from [`config::Settings`].

use std::sync::Arc;
use tracing::info;
use vectorizer::{
    EmbedError, EmbeddingService, HashingLoader, ModelLoader, ModelRegistry, OpenAiLoader,
    SourceResolver,
};

use config::{Backend, Settings};

/// Loader for the configured backend.
pub fn loader_for(settings: &Settings) -> Arc<dyn ModelLoader> {
    match settings.backend {
        Backend::Hashing => Arc::new(HashingLoader::new(settings.hashing_dimension)),
        Backend::OpenAi => match &settings.openai_base_url {
            Some(url) => Arc::new(OpenAiLoader::with_api_base(url.clone())),
            None => Arc::new(OpenAiLoader::new()),
        },
    }
}

/// Creates the registry and starts the service, loading the default model.
///
/// Fails when the default model cannot be loaded; the server must not start then.
pub async fn build_service(settings: &Settings) -> Result<Arc<EmbeddingService>, EmbedError> {
    info!(
        backend = ?settings.backend,
        model = %settings.model_url,
        staging = %settings.temp_dir.display(),
        "starting embedding service"
    );
    let registry = Arc::new(ModelRegistry::new(
        SourceResolver::new(settings.temp_dir.clone()),
        loader_for(settings),
    ));
    let service = EmbeddingService::start(registry, settings.service_options()).await?;
    Ok(Arc::new(service))
}
