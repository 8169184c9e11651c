//! Queue/store error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    /// The backing store is unreachable. Retried by the worker loop with a
    /// 1 s backoff; never retried by this crate itself.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("lock already held for video {video_id}")]
    LockHeld { video_id: String },

    #[error("no live status found for video {video_id}")]
    StatusNotFound { video_id: String },

    #[error("model config not found for key {model_key}; available: {available:?}")]
    ModelConfigNotFound {
        model_key: String,
        available: Vec<String>,
    },

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every Redis error observed once a connection is established is treated
/// as a store-unavailable condition, per the key-value client's contract:
/// this layer does not distinguish timeouts from connection resets, and it
/// never retries on its own.
impl From<redis::RedisError> for QueueError {
    fn from(e: redis::RedisError) -> Self {
        QueueError::StoreUnavailable(e.to_string())
    }
}
