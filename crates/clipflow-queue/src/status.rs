//! Status / history service (C8): initialize, mutate, finalize, and archive
//! pipeline status atomically against the key-value store.

use clipflow_models::{LiveStatusRecord, PipelineStatus, Stage, StageStatus};

use crate::error::{QueueError, QueueResult};
use crate::kv::KvClient;

/// TTL for an archived run.
pub const HISTORY_TTL_SECS: u64 = 24 * 3600;

/// Maximum number of archived runs retained per video; oldest evicted on
/// insert once this bound is exceeded.
pub const HISTORY_MAX_RUNS: u64 = 50;

fn live_key(video_id: &str) -> String {
    format!("pipeline:{video_id}:active")
}

fn run_key(request_id: &str) -> String {
    format!("run:{request_id}")
}

fn history_key(video_id: &str) -> String {
    format!("pipeline:{video_id}:history")
}

pub struct StatusService {
    kv: KvClient,
}

impl StatusService {
    pub fn new(kv: KvClient) -> Self {
        Self { kv }
    }

    pub async fn initialize_status(
        &self,
        video_id: &str,
        request_id: &str,
        generation_model: &str,
        refinement_model: &str,
        config: &str,
        stages: &[Stage],
    ) -> QueueResult<()> {
        let rec = LiveStatusRecord::new(
            request_id,
            video_id,
            generation_model,
            refinement_model,
            config,
            now_secs(),
            stages,
        );
        self.kv.hset_multiple(&live_key(video_id), &rec.to_fields()).await
    }

    pub async fn get_status(&self, video_id: &str) -> QueueResult<Option<LiveStatusRecord>> {
        let fields = self.kv.hgetall(&live_key(video_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(LiveStatusRecord::from_fields(&fields))
    }

    async fn set_fields(&self, video_id: &str, fields: Vec<(String, String)>) -> QueueResult<()> {
        for (field, value) in fields {
            self.kv.hset(&live_key(video_id), &field, &value).await?;
        }
        Ok(())
    }

    pub async fn mark_stage_started(&self, video_id: &str, stage: Stage) -> QueueResult<()> {
        let prefix = stage.as_str();
        self.set_fields(
            video_id,
            vec![
                (format!("{prefix}_status"), StageStatus::Processing.as_str().to_string()),
                (format!("{prefix}_started_at"), now_secs().to_string()),
            ],
        )
        .await
    }

    pub async fn mark_stage_completed(&self, video_id: &str, stage: Stage) -> QueueResult<()> {
        let prefix = stage.as_str();
        self.set_fields(
            video_id,
            vec![
                (format!("{prefix}_status"), StageStatus::Completed.as_str().to_string()),
                (format!("{prefix}_completed_at"), now_secs().to_string()),
            ],
        )
        .await
    }

    pub async fn mark_stage_skipped(
        &self,
        video_id: &str,
        stage: Stage,
        reason: &str,
    ) -> QueueResult<()> {
        let prefix = stage.as_str();
        self.set_fields(
            video_id,
            vec![
                (format!("{prefix}_status"), StageStatus::Skipped.as_str().to_string()),
                (format!("{prefix}_skipped"), "true".to_string()),
                (format!("{prefix}_skip_reason"), reason.to_string()),
            ],
        )
        .await
    }

    pub async fn mark_stage_failed(
        &self,
        video_id: &str,
        stage: Stage,
        error: &str,
    ) -> QueueResult<()> {
        let prefix = stage.as_str();
        self.set_fields(
            video_id,
            vec![
                (format!("{prefix}_status"), StageStatus::Failed.as_str().to_string()),
                (format!("{prefix}_completed_at"), now_secs().to_string()),
                ("error_stage".to_string(), stage.as_str().to_string()),
                ("error_message".to_string(), error.to_string()),
            ],
        )
        .await
    }

    pub async fn update_pipeline_status(&self, video_id: &str, status: PipelineStatus) -> QueueResult<()> {
        let mut fields = vec![("status".to_string(), status.as_str().to_string())];
        if status.is_terminal() {
            fields.push(("completed_at".to_string(), now_secs().to_string()));
        }
        self.set_fields(video_id, fields).await
    }

    pub async fn update_current_stage(&self, video_id: &str, stage: Stage) -> QueueResult<()> {
        self.kv
            .hset(&live_key(video_id), "current_stage", stage.as_str())
            .await
    }

    /// Free-form progress field setter, used by stage executors for
    /// `download_bytes`/`upload_bytes`/`clips_processed`/etc and for
    /// handoff slots like `audio_signed_url`.
    pub async fn set_progress_field(&self, video_id: &str, field: &str, value: &str) -> QueueResult<()> {
        self.kv.hset(&live_key(video_id), field, value).await
    }

    pub async fn get_progress_field(&self, video_id: &str, field: &str) -> QueueResult<Option<String>> {
        self.kv.hget(&live_key(video_id), field).await
    }

    pub async fn update_refinement_progress(
        &self,
        video_id: &str,
        total: u32,
        processed: u32,
        successful: Option<u32>,
    ) -> QueueResult<()> {
        self.kv
            .hset(&live_key(video_id), "refinement_total", &total.to_string())
            .await?;
        self.kv
            .hset(&live_key(video_id), "refinement_processed", &processed.to_string())
            .await?;
        if let Some(s) = successful {
            self.kv
                .hset(&live_key(video_id), "refinement_successful", &s.to_string())
                .await?;
        }
        Ok(())
    }

    /// Move the live status hash to an archived, TTL-bound record, append
    /// it to the video's history index, evict the oldest entries past
    /// [`HISTORY_MAX_RUNS`], and delete the live hash.
    pub async fn archive_active_to_history(&self, video_id: &str) -> QueueResult<String> {
        let fields = self.kv.hgetall(&live_key(video_id)).await?;
        if fields.is_empty() {
            return Err(QueueError::StatusNotFound {
                video_id: video_id.to_string(),
            });
        }
        let request_id = fields
            .get("request_id")
            .cloned()
            .ok_or_else(|| QueueError::StatusNotFound {
                video_id: video_id.to_string(),
            })?;
        let completed_at: f64 = fields
            .get("completed_at")
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(now_secs);

        self.kv.hset_multiple(&run_key(&request_id), &fields).await?;
        self.kv.expire(&run_key(&request_id), HISTORY_TTL_SECS).await?;

        self.kv
            .zadd(&history_key(video_id), &request_id, completed_at)
            .await?;

        self.evict_excess_history(video_id).await?;

        self.kv.del(&live_key(video_id)).await?;

        Ok(request_id)
    }

    async fn evict_excess_history(&self, video_id: &str) -> QueueResult<()> {
        let count = self.kv.zcard(&history_key(video_id)).await?;
        if count <= HISTORY_MAX_RUNS {
            return Ok(());
        }
        let excess = (count - HISTORY_MAX_RUNS) as isize;
        let oldest = self.kv.zrange(&history_key(video_id), 0, excess - 1).await?;
        for request_id in oldest {
            self.kv.zrem(&history_key(video_id), &request_id).await?;
            self.kv.del(&run_key(&request_id)).await?;
        }
        Ok(())
    }

    pub async fn get_latest_run(&self, video_id: &str) -> QueueResult<Option<LiveStatusRecord>> {
        let latest = self.kv.zrevrange(&history_key(video_id), 0, 0).await?;
        match latest.first() {
            Some(request_id) => self.get_run(request_id).await,
            None => Ok(None),
        }
    }

    pub async fn get_all_runs(&self, video_id: &str, limit: Option<usize>) -> QueueResult<Vec<LiveStatusRecord>> {
        let stop = match limit {
            Some(n) => (n as isize).saturating_sub(1),
            None => -1,
        };
        let request_ids = self.kv.zrevrange(&history_key(video_id), 0, stop).await?;
        let mut runs = Vec::with_capacity(request_ids.len());
        for request_id in request_ids {
            if let Some(run) = self.get_run(&request_id).await? {
                runs.push(run);
            }
        }
        Ok(runs)
    }

    async fn get_run(&self, request_id: &str) -> QueueResult<Option<LiveStatusRecord>> {
        let fields = self.kv.hgetall(&run_key(request_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(LiveStatusRecord::from_fields(&fields))
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
