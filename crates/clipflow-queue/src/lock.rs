//! Per-video exclusive lock and cancellation flag (C9).

use serde::{Deserialize, Serialize};

use crate::error::QueueResult;
use crate::kv::KvClient;

/// TTL for the per-video lock: covers the worst-case single stage: the
/// orchestrator refreshes between every stage to survive legitimately long
/// runs.
pub const LOCK_TTL_SECS: u64 = 1800;

/// TTL for a cancellation flag.
pub const CANCEL_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub request_id: String,
    pub acquired_at: f64,
    pub owner_id: String,
}

pub struct LockService {
    kv: KvClient,
}

fn lock_key(video_id: &str) -> String {
    format!("lock:{video_id}")
}

fn cancel_key(video_id: &str) -> String {
    format!("cancel:{video_id}")
}

impl LockService {
    pub fn new(kv: KvClient) -> Self {
        Self { kv }
    }

    /// Set `lock:{video_id}` with the owning request's info using
    /// set-if-absent. Returns true iff the key did not already exist.
    pub async fn acquire_lock(
        &self,
        video_id: &str,
        request_id: &str,
        owner_id: &str,
    ) -> QueueResult<bool> {
        let info = LockInfo {
            request_id: request_id.to_string(),
            acquired_at: now_secs(),
            owner_id: owner_id.to_string(),
        };
        let payload = serde_json::to_string(&info)?;
        self.kv
            .set_if_absent(&lock_key(video_id), &payload, LOCK_TTL_SECS)
            .await
    }

    /// Extend the lock's TTL back to [`LOCK_TTL_SECS`] if it exists.
    /// Idempotent; a missing key is not an error.
    pub async fn refresh_lock(&self, video_id: &str) -> QueueResult<bool> {
        self.kv.expire(&lock_key(video_id), LOCK_TTL_SECS).await
    }

    /// Delete the lock unconditionally. The caller must be the owner; no
    /// compare-and-delete is needed because only the lock holder advances
    /// the run.
    pub async fn release_lock(&self, video_id: &str) -> QueueResult<()> {
        self.kv.del(&lock_key(video_id)).await
    }

    pub async fn is_locked(&self, video_id: &str) -> QueueResult<(bool, Option<LockInfo>)> {
        match self.kv.get(&lock_key(video_id)).await? {
            Some(raw) => {
                let info: LockInfo = serde_json::from_str(&raw)?;
                Ok((true, Some(info)))
            }
            None => Ok((false, None)),
        }
    }

    pub async fn set_cancellation(&self, video_id: &str) -> QueueResult<()> {
        self.kv
            .set(&cancel_key(video_id), "1", Some(CANCEL_TTL_SECS))
            .await
    }

    pub async fn check_cancellation(&self, video_id: &str) -> QueueResult<bool> {
        self.kv.exists(&cancel_key(video_id)).await
    }

    pub async fn clear_cancellation(&self, video_id: &str) -> QueueResult<()> {
        self.kv.del(&cancel_key(video_id)).await
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
