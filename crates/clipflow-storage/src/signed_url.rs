//! Time-limited signed URL generation for staged objects (S3, S7).
//!
//! The source video and extracted audio are uploaded under deterministic
//! per-video keys; a signed GET URL is handed to the next stage (or to the
//! consumer of a completed run) rather than the object bytes themselves.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::client::R2Client;
use crate::error::StorageResult;

/// Default expiry for the audio handoff URL consumed by the transcription
/// stage (`spec.md` S3: "1 h").
pub const AUDIO_SIGNED_URL_EXPIRY_SECS: u64 = 3600;

/// A signed URL plus its absolute expiry, for persistence into LiveStatus.
#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl R2Client {
    /// Generate a signed GET URL for `key`, valid for `expiry`.
    pub async fn signed_url(&self, key: &str, expiry: Duration) -> StorageResult<SignedUrl> {
        let url = self.presign_get(key, expiry).await?;
        let expires_at = Utc::now() + chrono::Duration::from_std(expiry).unwrap_or_default();
        Ok(SignedUrl { url, expires_at })
    }

    /// Generate a signed GET URL using the default audio handoff expiry.
    pub async fn audio_signed_url(&self, key: &str) -> StorageResult<SignedUrl> {
        self.signed_url(key, Duration::from_secs(AUDIO_SIGNED_URL_EXPIRY_SECS))
            .await
    }
}
