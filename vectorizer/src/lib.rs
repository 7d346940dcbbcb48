//! # Vectorizer
//!
//! Concurrency-bounded text embedding. Turns texts into fixed-length vectors with a
//! pluggable inference backend while capping the number of inference calls in flight.
//!
//! ## Pieces
//!
//! - [`ModelRegistry`]: loads each model once per source identifier, on first use, and
//!   shares it with every request. Failed loads are not cached.
//! - [`ConcurrencyLimiter`]: fixed pool of permits; one permit is held around each
//!   inference call and released on every exit path.
//! - [`BatchDispatcher`]: splits batches into partitions and runs them on the runtime's
//!   worker pool, either waiting for all results or streaming them as they complete.
//! - [`EmbeddingService`]: the public operations ([`EmbeddingService::embed_one`],
//!   [`EmbeddingService::embed_many`], [`EmbeddingService::embed_many_streaming`],
//!   [`EmbeddingService::health_check`]).
//! - [`catalog`]: static table of known model types ([`catalog::lookup`]).
//! - [`protocol`]: JSON request/response types used by the WebSocket server.
//!
//! Backends implement [`ModelLoader`] and [`Predictor`]; [`HashingLoader`] runs offline and
//! [`OpenAiLoader`] talks to any OpenAI-compatible embeddings endpoint.

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod limiter;
pub mod model;
pub mod protocol;
pub mod service;

pub use catalog::{ModelDescriptor, ModelType};
pub use dispatch::{BatchDispatcher, EmbeddingStream, StreamItem};
pub use error::EmbedError;
pub use limiter::{ConcurrencyLimiter, Permit};
pub use model::{
    HashingLoader, HashingPredictor, ModelHandle, ModelLoader, ModelRegistry, OpenAiLoader,
    OpenAiPredictor, Predictor, SourceResolver,
};
pub use service::{EmbedOptions, EmbeddingService, ModelSource, ServiceOptions, HEALTH_STATUS};

pub use tokio_util::sync::CancellationToken;
