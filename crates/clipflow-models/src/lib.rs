//! Shared data models for the video pipeline orchestrator.
//!
//! This crate provides the typed records that stand in for the source
//! system's free-form maps: identifiers and their derivation rules, the
//! pipeline's stage/status vocabulary, submission-time configuration and
//! its validation, transcripts, moments, model connection parameters, and
//! the decoded shape of a generation model's response.

pub mod ai_response;
pub mod config;
pub mod ids;
pub mod model_config;
pub mod moment;
pub mod stage;
pub mod status;
pub mod transcript;
pub mod video;

pub use ai_response::{AiResponse, RawMoment};
pub use config::{ModelChoice, PipelineConfig, ValidationError};
pub use ids::{generate_video_id, moment_id, ModelKey, RequestId, VideoId};
pub use model_config::{
    default_model_configs, ApiPath, ModelConfig, ModelConnectionMode,
};
pub use moment::{GenerationConfig, Moment};
pub use stage::{PipelineStatus, Stage, StageStatus, FULL_STAGES, TEXT_ONLY_STAGES};
pub use status::{LiveStatusRecord, StageRecord};
pub use transcript::{SegmentTimestamp, Transcript, WordTimestamp};
pub use video::VideoRecord;
