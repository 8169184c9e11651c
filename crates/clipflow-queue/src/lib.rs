//! Key-value client, state/status services, and durable stream primitives
//! backing the pipeline control plane.
//!
//! - [`kv`]: pooled async client over the shared store (C1).
//! - [`lock`]: per-video exclusive lock and cancellation flag (C9).
//! - [`status`]: live status mutation and history archival (C8).
//! - [`job_tracker`]: granular per-stage job records (C3).
//! - [`model_registry`]: per-model connection parameters (C4).
//! - [`stream`]: `pipeline:requests` consumer-group primitives (C12 plumbing).

pub mod error;
pub mod job_tracker;
pub mod kv;
pub mod lock;
pub mod model_registry;
pub mod status;
pub mod stream;

pub use error::{QueueError, QueueResult};
pub use job_tracker::{JobTrackStatus, JobTracker, JOB_LOCK_TTL_SECS, JOB_RESULT_TTL_SECS};
pub use kv::KvClient;
pub use lock::{LockInfo, LockService, CANCEL_TTL_SECS, LOCK_TTL_SECS};
pub use model_registry::ModelRegistry;
pub use status::{StatusService, HISTORY_MAX_RUNS, HISTORY_TTL_SECS};
pub use stream::{RequestStream, StreamMessage, CONSUMER_GROUP, REQUESTS_STREAM};
