//! Process-wide per-stage-class concurrency limiter (C7).
//!
//! `spec.md` §5 bounds how many stage executions of each class may run at
//! once across the whole worker process, independent of how many videos are
//! in flight. Grounded on the teacher's `ffmpeg_semaphore`/`job_semaphore`
//! pattern (`processor.rs`, `executor.rs`): one `Arc<Semaphore>` per class,
//! an owned permit held for the stage's duration.

use std::sync::Arc;

use clipflow_models::Stage;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ConcurrencyLimits;

/// The five stage classes `spec.md` §5 names. `download` is intentionally
/// unbounded at this layer (I/O-bound, externally rate-limited by yt-dlp).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageClass {
    AudioExtraction,
    Transcription,
    MomentGeneration,
    ClipExtraction,
    Refinement,
}

impl StageClass {
    /// Map a pipeline stage to the semaphore class that governs it, or
    /// `None` for stages with no global bound (download, upload stages).
    pub fn for_stage(stage: Stage) -> Option<Self> {
        match stage {
            Stage::Audio => Some(Self::AudioExtraction),
            Stage::Transcript => Some(Self::Transcription),
            Stage::Generation => Some(Self::MomentGeneration),
            Stage::Clips => Some(Self::ClipExtraction),
            Stage::Refinement => Some(Self::Refinement),
            Stage::Download | Stage::AudioUpload | Stage::ClipUpload => None,
        }
    }
}

pub struct StagePermit(#[allow(dead_code)] OwnedSemaphorePermit);

/// Holds one named semaphore per stage class, sized from `WorkerConfig`.
pub struct ConcurrencyLimiter {
    audio_extraction: Arc<Semaphore>,
    transcription: Arc<Semaphore>,
    moment_generation: Arc<Semaphore>,
    clip_extraction: Arc<Semaphore>,
    refinement: Arc<Semaphore>,
}

impl ConcurrencyLimiter {
    pub fn new(limits: &ConcurrencyLimits) -> Self {
        Self {
            audio_extraction: Arc::new(Semaphore::new(limits.audio_extraction)),
            transcription: Arc::new(Semaphore::new(limits.transcription)),
            moment_generation: Arc::new(Semaphore::new(limits.moment_generation)),
            clip_extraction: Arc::new(Semaphore::new(limits.clip_extraction)),
            refinement: Arc::new(Semaphore::new(limits.refinement)),
        }
    }

    fn semaphore(&self, class: StageClass) -> &Arc<Semaphore> {
        match class {
            StageClass::AudioExtraction => &self.audio_extraction,
            StageClass::Transcription => &self.transcription,
            StageClass::MomentGeneration => &self.moment_generation,
            StageClass::ClipExtraction => &self.clip_extraction,
            StageClass::Refinement => &self.refinement,
        }
    }

    /// Acquire a permit for `class`, held until the returned guard drops.
    /// The semaphore is never closed, so this only fails if the process is
    /// tearing down.
    pub async fn acquire(&self, class: StageClass) -> Option<StagePermit> {
        self.semaphore(class).clone().acquire_owned().await.ok().map(StagePermit)
    }

    /// Acquire a permit for whichever class governs `stage`, or `None`
    /// (always granted) if the stage has no global bound.
    pub async fn acquire_for_stage(&self, stage: Stage) -> Option<StagePermit> {
        match StageClass::for_stage(stage) {
            Some(class) => self.acquire(class).await,
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_bounded_stages_to_their_class() {
        assert_eq!(StageClass::for_stage(Stage::Audio), Some(StageClass::AudioExtraction));
        assert_eq!(StageClass::for_stage(Stage::Transcript), Some(StageClass::Transcription));
        assert_eq!(StageClass::for_stage(Stage::Generation), Some(StageClass::MomentGeneration));
        assert_eq!(StageClass::for_stage(Stage::Clips), Some(StageClass::ClipExtraction));
        assert_eq!(StageClass::for_stage(Stage::Refinement), Some(StageClass::Refinement));
    }

    #[test]
    fn unbounded_stages_have_no_class() {
        assert_eq!(StageClass::for_stage(Stage::Download), None);
        assert_eq!(StageClass::for_stage(Stage::AudioUpload), None);
        assert_eq!(StageClass::for_stage(Stage::ClipUpload), None);
    }

    #[tokio::test]
    async fn moment_generation_is_globally_exclusive() {
        let limiter = ConcurrencyLimiter::new(&ConcurrencyLimits::default());
        let first = limiter.acquire(StageClass::MomentGeneration).await;
        assert!(first.is_some());
        assert_eq!(limiter.moment_generation.available_permits(), 0);
    }
}
