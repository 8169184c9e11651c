//! Job tracker (C3): lightweight records for stages that expose granular
//! progress, keyed by `{job_type, video_id[, sub_id]}` with TTL-based
//! auto-expiry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::QueueResult;
use crate::kv::KvClient;

/// TTL while a tracked job is running.
pub const JOB_LOCK_TTL_SECS: u64 = 1800;
/// TTL once a tracked job reaches a terminal state.
pub const JOB_RESULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTrackStatus {
    Running,
    Completed,
    Failed,
}

impl JobTrackStatus {
    fn as_str(&self) -> &'static str {
        match self {
            JobTrackStatus::Running => "running",
            JobTrackStatus::Completed => "completed",
            JobTrackStatus::Failed => "failed",
        }
    }
}

fn job_key(job_type: &str, video_id: &str, sub_id: Option<&str>) -> String {
    match sub_id {
        Some(sub) => format!("job:{job_type}:{video_id}:{sub}"),
        None => format!("job:{job_type}:{video_id}"),
    }
}

pub struct JobTracker {
    kv: KvClient,
}

impl JobTracker {
    pub fn new(kv: KvClient) -> Self {
        Self { kv }
    }

    pub async fn start(
        &self,
        job_type: &str,
        video_id: &str,
        sub_id: Option<&str>,
    ) -> QueueResult<()> {
        let key = job_key(job_type, video_id, sub_id);
        let mut fields = HashMap::new();
        fields.insert("status".to_string(), JobTrackStatus::Running.as_str().to_string());
        fields.insert("started_at".to_string(), now_secs().to_string());
        self.kv.hset_multiple(&key, &fields).await?;
        self.kv.expire(&key, JOB_LOCK_TTL_SECS).await?;
        Ok(())
    }

    pub async fn set_progress(
        &self,
        job_type: &str,
        video_id: &str,
        sub_id: Option<&str>,
        field: &str,
        value: &str,
    ) -> QueueResult<()> {
        let key = job_key(job_type, video_id, sub_id);
        self.kv.hset(&key, field, value).await
    }

    pub async fn complete(
        &self,
        job_type: &str,
        video_id: &str,
        sub_id: Option<&str>,
    ) -> QueueResult<()> {
        let key = job_key(job_type, video_id, sub_id);
        self.kv.hset(&key, "status", JobTrackStatus::Completed.as_str()).await?;
        self.kv.hset(&key, "completed_at", &now_secs().to_string()).await?;
        self.kv.expire(&key, JOB_RESULT_TTL_SECS).await?;
        Ok(())
    }

    pub async fn fail(
        &self,
        job_type: &str,
        video_id: &str,
        sub_id: Option<&str>,
        error: &str,
    ) -> QueueResult<()> {
        let key = job_key(job_type, video_id, sub_id);
        self.kv.hset(&key, "status", JobTrackStatus::Failed.as_str()).await?;
        self.kv.hset(&key, "completed_at", &now_secs().to_string()).await?;
        self.kv.hset(&key, "error", error).await?;
        self.kv.expire(&key, JOB_RESULT_TTL_SECS).await?;
        Ok(())
    }

    pub async fn get(
        &self,
        job_type: &str,
        video_id: &str,
        sub_id: Option<&str>,
    ) -> QueueResult<Option<HashMap<String, String>>> {
        let key = job_key(job_type, video_id, sub_id);
        let fields = self.kv.hgetall(&key).await?;
        if fields.is_empty() {
            Ok(None)
        } else {
            Ok(Some(fields))
        }
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
