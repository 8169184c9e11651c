//! Worker error types: every `spec.md` §7 kind except `ValidationFailed`,
//! which is rejected before a request reaches the worker.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("tunnel unavailable: {0}")]
    TunnelUnavailable(String),

    #[error("remote service error: {0}")]
    RemoteServiceError(String),

    #[error("remote call timed out after {elapsed_secs:.1}s")]
    RemoteTimeout { elapsed_secs: f64 },

    #[error("response parse error: {0}")]
    ParseError(String),

    #[error("media tool error: {0}")]
    MediaToolError(String),

    #[error("stage {stage} exceeded its {limit_secs}s timeout")]
    StageTimeout { stage: String, limit_secs: u64 },

    #[error("cancelled")]
    Cancelled,

    #[error("repository error: {0}")]
    Repo(#[from] clipflow_repo::RepoError),

    #[error("media error: {0}")]
    Media(#[from] clipflow_media::MediaError),

    #[error("storage error: {0}")]
    Storage(#[from] clipflow_storage::StorageError),

    #[error("inference error: {0}")]
    Inference(#[from] clipflow_inference::InferenceError),

    #[error("queue error: {0}")]
    Queue(#[from] clipflow_queue::QueueError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn resource_not_found(msg: impl Into<String>) -> Self {
        Self::ResourceNotFound(msg.into())
    }

    pub fn media_tool(msg: impl Into<String>) -> Self {
        Self::MediaToolError(msg.into())
    }

    pub fn stage_timeout(stage: impl Into<String>, limit_secs: u64) -> Self {
        Self::StageTimeout {
            stage: stage.into(),
            limit_secs,
        }
    }

    /// A stage's own `try` catches every kind except `Cancelled` (observed
    /// only between stages) and `StoreUnavailable` (bubbles to the worker
    /// loop for a 1s backoff), per `spec.md` §4.7/§7.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, WorkerError::StoreUnavailable(_))
            || matches!(self, WorkerError::Queue(clipflow_queue::QueueError::StoreUnavailable(_)))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled)
    }

    /// Errors worth a transient retry at the HTTP-call boundary: connection
    /// resets, timeouts, and store unavailability. Excludes parse/validation
    /// failures, which re-running would reproduce identically.
    pub fn is_retryable(&self) -> bool {
        use clipflow_inference::InferenceError;
        matches!(
            self,
            WorkerError::StoreUnavailable(_)
                | WorkerError::TunnelUnavailable(_)
                | WorkerError::RemoteTimeout { .. }
                | WorkerError::RemoteServiceError(_)
                | WorkerError::Inference(InferenceError::TunnelUnavailable { .. })
                | WorkerError::Inference(InferenceError::RemoteTimeout { .. })
                | WorkerError::Inference(InferenceError::RemoteServiceError { .. })
        )
    }
}
