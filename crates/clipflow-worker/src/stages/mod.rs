//! Stage executors (S1-S8). Each module exposes an `already_*`/similar
//! skip-check helper plus a `run` that performs the stage's work; the
//! orchestrator decides which to call and in what order.

pub mod align;
pub mod audio;
pub mod audio_upload;
pub mod clip_upload;
pub mod clips;
pub mod context;
pub mod download;
pub mod generation;
pub mod refinement;
pub mod transcript;

pub use context::StageContext;
