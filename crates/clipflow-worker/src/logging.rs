//! Structured stage logging utilities.
//!
//! Provides consistent, structured logging for stage execution with
//! tracing spans and contextual information, analogous to the teacher's
//! `JobLogger` but parameterized by video/request/stage instead of a bare
//! job id and operation name.

use tracing::{error, info, warn, Span};

use clipflow_models::{RequestId, Stage, VideoId};

/// Stage logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    video_id: String,
    request_id: String,
    stage: &'static str,
}

impl JobLogger {
    pub fn new(video_id: &VideoId, request_id: &RequestId, stage: Stage) -> Self {
        Self {
            video_id: video_id.to_string(),
            request_id: request_id.to_string(),
            stage: stage.as_str(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            request_id = %self.request_id,
            stage = self.stage,
            "stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            request_id = %self.request_id,
            stage = self.stage,
            "stage progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            request_id = %self.request_id,
            stage = self.stage,
            "stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            request_id = %self.request_id,
            stage = self.stage,
            "stage error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            request_id = %self.request_id,
            stage = self.stage,
            "stage completed: {}", message
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Create a tracing span carrying this logger's identifying fields, for
    /// attaching to the `Future` driving the stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            video_id = %self.video_id,
            request_id = %self.request_id,
            stage = self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_identifying_fields() {
        let video_id = VideoId::from_string("abc123");
        let request_id = RequestId::new(&video_id, 1_700_000_000_000);
        let logger = JobLogger::new(&video_id, &request_id, Stage::Transcript);

        assert_eq!(logger.video_id(), "abc123");
        assert_eq!(logger.stage(), "transcript");
        assert!(logger.request_id().starts_with("pipeline:abc123:"));
    }
}
