//! Errors reported by the embedding pipeline.

use thiserror::Error;

/// Errors that can occur while loading models, waiting for capacity, or running inference.
///
/// Every variant is reported to the immediate caller; none of them is cached or retried
/// internally. [`EmbedError::kind`] gives the stable name used on the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbedError {
    /// The model source could not be resolved, or the artifact could not be loaded.
    /// A later request for the same model retries the load.
    #[error("model unavailable: {model}: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// The inference backend failed on one input.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Model type outside the static catalog.
    #[error("model type not found: {0}")]
    NotFound(String),

    /// The caller abandoned the request while it was waiting for a permit.
    #[error("permit acquisition cancelled")]
    PermitAcquisitionCancelled,

    /// A worker task panicked or was aborted before producing its results.
    #[error("worker task failed: {0}")]
    TaskFailed(String),
}

impl EmbedError {
    pub(crate) fn unavailable(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModelUnavailable {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable snake_case name of the error kind (sent as `kind` in error responses).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::Inference(_) => "inference_error",
            Self::NotFound(_) => "not_found",
            Self::PermitAcquisitionCancelled => "permit_acquisition_cancelled",
            Self::TaskFailed(_) => "task_failed",
        }
    }
}

impl From<tokio::task::JoinError> for EmbedError {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_cancelled() {
            Self::TaskFailed("task aborted".to_string())
        } else {
            Self::TaskFailed(e.to_string())
        }
    }
}
