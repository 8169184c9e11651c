//! Inference/transcription/tunnel error taxonomy.

use thiserror::Error;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// Port forward could not be established or verified within its health
    /// check window.
    #[error("tunnel unavailable for model '{model_key}': {reason}")]
    TunnelUnavailable { model_key: String, reason: String },

    /// The remote request ran past its deadline.
    #[error("remote call to '{model_key}' timed out after {elapsed_secs:.1}s")]
    RemoteTimeout { model_key: String, elapsed_secs: f64 },

    /// HTTP 4xx/5xx or connection failure from the remote service.
    #[error("remote service error from '{model_key}': {message}")]
    RemoteServiceError { model_key: String, message: String },

    /// The response body could not be coerced into the expected shape.
    #[error("failed to parse response from '{model_key}': {message}")]
    ParseError { model_key: String, message: String },

    /// No registered `ModelConfig` for this key.
    #[error("unknown model key: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
