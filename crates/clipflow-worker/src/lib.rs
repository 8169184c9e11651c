#![deny(unreachable_patterns)]
//! Video processing pipeline worker.
//!
//! This crate provides:
//! - Stage executors for the 8-stage pipeline (`stages`)
//! - The per-run orchestrator (`orchestrator`)
//! - The stream consumer loop (`stream_worker`)
//! - Global per-stage-class concurrency limiting (`concurrency`)
//! - Structured stage logging (`logging`)

pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod stages;
pub mod stream_worker;

pub use concurrency::{ConcurrencyLimiter, StageClass, StagePermit};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use stages::StageContext;
pub use stream_worker::StreamWorker;
