//! Pipeline stage tags, ordering, and top-level/per-stage status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step in the pipeline's ordered stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    Audio,
    AudioUpload,
    Transcript,
    Generation,
    Clips,
    ClipUpload,
    Refinement,
}

/// Full 8-stage sequence, used when the refinement model supports video.
pub const FULL_STAGES: &[Stage] = &[
    Stage::Download,
    Stage::Audio,
    Stage::AudioUpload,
    Stage::Transcript,
    Stage::Generation,
    Stage::Clips,
    Stage::ClipUpload,
    Stage::Refinement,
];

/// 6-stage sequence omitting `clips`/`clip_upload`, used when the refinement
/// model does not support video.
pub const TEXT_ONLY_STAGES: &[Stage] = &[
    Stage::Download,
    Stage::Audio,
    Stage::AudioUpload,
    Stage::Transcript,
    Stage::Generation,
    Stage::Refinement,
];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Audio => "audio",
            Stage::AudioUpload => "audio_upload",
            Stage::Transcript => "transcript",
            Stage::Generation => "generation",
            Stage::Clips => "clips",
            Stage::ClipUpload => "clip_upload",
            Stage::Refinement => "refinement",
        }
    }

    /// Select the stage sequence for a run based on whether the chosen
    /// refinement model supports video input.
    pub fn stage_set(supports_video: bool) -> &'static [Stage] {
        if supports_video {
            FULL_STAGES
        } else {
            TEXT_ONLY_STAGES
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level pipeline run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Pending => "pending",
            PipelineStatus::Processing => "processing",
            PipelineStatus::Completed => "completed",
            PipelineStatus::Failed => "failed",
            PipelineStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Completed | PipelineStatus::Failed | PipelineStatus::Cancelled
        )
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-stage status within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Skipped,
    Failed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Processing => "processing",
            StageStatus::Completed => "completed",
            StageStatus::Skipped => "skipped",
            StageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_capable_model_gets_full_sequence() {
        assert_eq!(Stage::stage_set(true), FULL_STAGES);
        assert_eq!(FULL_STAGES.len(), 8);
    }

    #[test]
    fn text_only_model_omits_clip_stages() {
        let stages = Stage::stage_set(false);
        assert_eq!(stages.len(), 6);
        assert!(!stages.contains(&Stage::Clips));
        assert!(!stages.contains(&Stage::ClipUpload));
    }

    #[test]
    fn pipeline_status_terminal_classification() {
        assert!(!PipelineStatus::Pending.is_terminal());
        assert!(!PipelineStatus::Processing.is_terminal());
        assert!(PipelineStatus::Completed.is_terminal());
        assert!(PipelineStatus::Failed.is_terminal());
        assert!(PipelineStatus::Cancelled.is_terminal());
    }
}
