//! Worker configuration: stream/consumer-group names, object-store
//! credentials indirection, per-stage-class concurrency bounds, and the
//! control-plane TTL constants, loaded the way the teacher's `WorkerConfig`
//! does — one env var per field with a typed default fallback.

use std::time::Duration;

use clipflow_queue::{CANCEL_TTL_SECS, HISTORY_MAX_RUNS, HISTORY_TTL_SECS, JOB_LOCK_TTL_SECS, JOB_RESULT_TTL_SECS, LOCK_TTL_SECS};
use clipflow_storage::R2Config;

use crate::error::WorkerResult;

/// Idle threshold before `xautoclaim` reclaims a stale stream entry
/// (`spec.md` §4.8).
pub const STALE_CLAIM_IDLE_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct ConcurrencyLimits {
    pub audio_extraction: usize,
    pub transcription: usize,
    pub moment_generation: usize,
    pub clip_extraction: usize,
    pub refinement: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            audio_extraction: 4,
            transcription: 2,
            moment_generation: 1,
            clip_extraction: 2,
            refinement: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub redis_url: String,
    pub requests_stream: String,
    pub consumer_group: String,
    pub r2: R2Config,
    pub concurrency: ConcurrencyLimits,
    pub work_dir: String,
    pub claim_interval: Duration,
    pub claim_min_idle_ms: u64,
    pub lock_ttl_secs: u64,
    pub cancel_ttl_secs: u64,
    pub history_ttl_secs: u64,
    pub history_max_runs: u64,
    pub job_lock_ttl_secs: u64,
    pub job_result_ttl_secs: u64,
}

impl WorkerConfig {
    /// Load from environment, following the teacher's `from_env()`
    /// convention: each field reads its own var, falling back to the
    /// documented default on anything unset or unparseable.
    pub fn from_env() -> WorkerResult<Self> {
        let r2 = R2Config::from_env()?;

        Ok(Self {
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            requests_stream: env_or("PIPELINE_REQUESTS_STREAM", "pipeline:requests"),
            consumer_group: env_or("PIPELINE_CONSUMER_GROUP", "pipeline_workers"),
            r2,
            concurrency: ConcurrencyLimits {
                audio_extraction: env_parsed("CONCURRENCY_AUDIO_EXTRACTION", 4),
                transcription: env_parsed("CONCURRENCY_TRANSCRIPTION", 2),
                moment_generation: env_parsed("CONCURRENCY_MOMENT_GENERATION", 1),
                clip_extraction: env_parsed("CONCURRENCY_CLIP_EXTRACTION", 2),
                refinement: env_parsed("CONCURRENCY_REFINEMENT", 3),
            },
            work_dir: env_or("WORKER_WORK_DIR", "/tmp/clipflow"),
            claim_interval: Duration::from_secs(env_parsed("WORKER_CLAIM_INTERVAL_SECS", 30)),
            claim_min_idle_ms: env_parsed("WORKER_CLAIM_MIN_IDLE_MS", STALE_CLAIM_IDLE_MS),
            lock_ttl_secs: env_parsed("LOCK_TTL_SECS", LOCK_TTL_SECS),
            cancel_ttl_secs: env_parsed("CANCEL_TTL_SECS", CANCEL_TTL_SECS),
            history_ttl_secs: env_parsed("HISTORY_TTL_SECS", HISTORY_TTL_SECS),
            history_max_runs: env_parsed("HISTORY_MAX_RUNS", HISTORY_MAX_RUNS),
            job_lock_ttl_secs: env_parsed("JOB_LOCK_TTL_SECS", JOB_LOCK_TTL_SECS),
            job_result_ttl_secs: env_parsed("JOB_RESULT_TTL_SECS", JOB_RESULT_TTL_SECS),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_concurrency_matches_documented_bounds() {
        let limits = ConcurrencyLimits::default();
        assert_eq!(limits.audio_extraction, 4);
        assert_eq!(limits.transcription, 2);
        assert_eq!(limits.moment_generation, 1);
        assert_eq!(limits.clip_extraction, 2);
        assert_eq!(limits.refinement, 3);
    }

    #[test]
    fn env_parsed_falls_back_on_unset() {
        std::env::remove_var("CLIPFLOW_TEST_UNSET_VAR");
        let value: u64 = env_parsed("CLIPFLOW_TEST_UNSET_VAR", 42);
        assert_eq!(value, 42);
    }
}
