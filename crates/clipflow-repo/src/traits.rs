//! Trait interfaces standing in for the relational repository layer. The
//! orchestrator and stage executors depend only on these traits; a concrete
//! implementation (e.g. a Postgres- or Firestore-backed one) is out of scope
//! here (`spec.md` §1 Non-goals) — `clipflow-repo::memory` provides an
//! in-memory implementation for tests.

use async_trait::async_trait;

use clipflow_models::{GenerationConfig, Moment, Transcript, VideoId, VideoRecord};

use crate::error::RepoResult;

/// Persisted video rows (S1 download/idempotent-skip).
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, video_id: &VideoId) -> RepoResult<Option<VideoRecord>>;

    /// Look up an existing row by source URL, for S1's skip-if-present check.
    async fn get_by_source_url(&self, source_url: &str) -> RepoResult<Option<VideoRecord>>;

    async fn create(&self, video: &VideoRecord) -> RepoResult<()>;

    async fn update_metadata(
        &self,
        video_id: &VideoId,
        duration_seconds: f64,
        width: u32,
        height: u32,
        fps: f64,
        codec: &str,
        size_bytes: u64,
        bitrate: u64,
    ) -> RepoResult<()>;
}

/// Persisted transcripts (S4 transcription).
#[async_trait]
pub trait TranscriptRepository: Send + Sync {
    async fn get(&self, video_id: &VideoId) -> RepoResult<Option<Transcript>>;
    async fn create(&self, video_id: &VideoId, transcript: &Transcript) -> RepoResult<()>;
}

/// Persisted moments and their generation-time config (S5 generation, S6
/// clips, S7 clip upload, S8 refinement).
#[async_trait]
pub trait MomentRepository: Send + Sync {
    async fn list_by_video(&self, video_id: &VideoId) -> RepoResult<Vec<Moment>>;

    /// Bulk-insert newly-generated moments, linked to a generation-config
    /// record created under the same stage.
    async fn bulk_insert(
        &self,
        video_id: &VideoId,
        moments: &[Moment],
        generation_config: &GenerationConfig,
    ) -> RepoResult<()>;

    /// Delete all non-refined moments for a video (override_existing_moments).
    async fn delete_unrefined(&self, video_id: &VideoId) -> RepoResult<()>;

    async fn update_clip_path(&self, moment_id: &str, clip_path: &str, cloud_url: &str) -> RepoResult<()>;

    async fn update_refinement(&self, moment_id: &str, refined: Moment) -> RepoResult<()>;
}
