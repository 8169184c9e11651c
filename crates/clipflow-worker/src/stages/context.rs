//! Shared dependency bundle each stage executor and the orchestrator run
//! against — repositories, remote clients, and control-plane services.

use std::sync::Arc;

use clipflow_inference::{Connector, InferenceClient, TranscriptionClient};
use clipflow_queue::{LockService, ModelRegistry, StatusService};
use clipflow_repo::{MomentRepository, TranscriptRepository, VideoRepository};
use clipflow_storage::R2Client;

use crate::concurrency::ConcurrencyLimiter;
use crate::config::WorkerConfig;

pub struct StageContext {
    pub config: WorkerConfig,
    pub videos: Arc<dyn VideoRepository>,
    pub transcripts: Arc<dyn TranscriptRepository>,
    pub moments: Arc<dyn MomentRepository>,
    pub status: Arc<StatusService>,
    pub lock: Arc<LockService>,
    pub models: Arc<ModelRegistry>,
    pub storage: Arc<R2Client>,
    pub connector: Arc<Connector>,
    pub transcription_client: Arc<TranscriptionClient>,
    pub inference_client: Arc<InferenceClient>,
    pub limiter: Arc<ConcurrencyLimiter>,
}

impl StageContext {
    pub fn video_work_dir(&self, video_id: &str) -> std::path::PathBuf {
        std::path::Path::new(&self.config.work_dir).join(video_id)
    }
}
