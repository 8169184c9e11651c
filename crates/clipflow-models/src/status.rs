//! Typed projection of the `LiveStatus`/`ArchivedRun` hash.
//!
//! The store itself holds a flat string-keyed hash (so that progress
//! callbacks and stage transitions can each touch one field atomically
//! without racing on a nested structure); this type is the in-process view
//! over that map, with conversions to and from the flat field form.

use std::collections::HashMap;

use crate::stage::{PipelineStatus, Stage, StageStatus};

/// Per-stage bookkeeping inside a [`LiveStatusRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageRecord {
    pub status: StageStatus,
    pub started_at: Option<f64>,
    pub completed_at: Option<f64>,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

/// In-flight or archived status of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStatusRecord {
    pub request_id: String,
    pub video_id: String,
    pub status: PipelineStatus,
    pub generation_model: String,
    pub refinement_model: String,
    pub config: String,
    pub started_at: f64,
    pub completed_at: Option<f64>,
    pub current_stage: Option<Stage>,
    pub error_stage: Option<Stage>,
    pub error_message: Option<String>,
    pub stages: HashMap<Stage, StageRecord>,
    /// Inter-stage handoff and progress fields not tied to a single stage
    /// tag, e.g. `download_bytes`, `clips_processed`, `audio_signed_url`.
    pub extra: HashMap<String, String>,
}

impl LiveStatusRecord {
    pub fn new(
        request_id: impl Into<String>,
        video_id: impl Into<String>,
        generation_model: impl Into<String>,
        refinement_model: impl Into<String>,
        config: impl Into<String>,
        started_at: f64,
        stages: &[Stage],
    ) -> Self {
        let mut stage_map = HashMap::new();
        for s in stages {
            stage_map.insert(*s, StageRecord::default());
        }
        Self {
            request_id: request_id.into(),
            video_id: video_id.into(),
            status: PipelineStatus::Pending,
            generation_model: generation_model.into(),
            refinement_model: refinement_model.into(),
            config: config.into(),
            started_at,
            completed_at: None,
            current_stage: None,
            error_stage: None,
            error_message: None,
            stages: stage_map,
            extra: HashMap::new(),
        }
    }

    /// Flatten into the wire hash form: `{field}` for top-level fields,
    /// `{stage}_status`/`{stage}_started_at`/... for per-stage fields, plus
    /// whatever is in `extra` verbatim.
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("request_id".into(), self.request_id.clone());
        fields.insert("video_id".into(), self.video_id.clone());
        fields.insert("status".into(), self.status.as_str().into());
        fields.insert("generation_model".into(), self.generation_model.clone());
        fields.insert("refinement_model".into(), self.refinement_model.clone());
        fields.insert("config".into(), self.config.clone());
        fields.insert("started_at".into(), self.started_at.to_string());
        fields.insert(
            "completed_at".into(),
            self.completed_at.map(|v| v.to_string()).unwrap_or_default(),
        );
        fields.insert(
            "current_stage".into(),
            self.current_stage.map(|s| s.as_str().to_string()).unwrap_or_default(),
        );
        fields.insert(
            "error_stage".into(),
            self.error_stage.map(|s| s.as_str().to_string()).unwrap_or_default(),
        );
        fields.insert(
            "error_message".into(),
            self.error_message.clone().unwrap_or_default(),
        );
        for (stage, rec) in &self.stages {
            let prefix = stage.as_str();
            fields.insert(format!("{prefix}_status"), rec.status.as_str().into());
            fields.insert(
                format!("{prefix}_started_at"),
                rec.started_at.map(|v| v.to_string()).unwrap_or_default(),
            );
            fields.insert(
                format!("{prefix}_completed_at"),
                rec.completed_at.map(|v| v.to_string()).unwrap_or_default(),
            );
            fields.insert(format!("{prefix}_skipped"), rec.skipped.to_string());
            fields.insert(
                format!("{prefix}_skip_reason"),
                rec.skip_reason.clone().unwrap_or_default(),
            );
        }
        for (k, v) in &self.extra {
            fields.insert(k.clone(), v.clone());
        }
        fields
    }

    /// Reconstruct from the flat wire hash. Any field outside the known
    /// top-level/per-stage set is kept in `extra` verbatim.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let request_id = fields.get("request_id")?.clone();
        let video_id = fields.get("video_id")?.clone();
        let status = parse_status(fields.get("status")?);
        let started_at: f64 = fields.get("started_at")?.parse().ok()?;

        let mut known: std::collections::HashSet<String> = [
            "request_id",
            "video_id",
            "status",
            "generation_model",
            "refinement_model",
            "config",
            "started_at",
            "completed_at",
            "current_stage",
            "error_stage",
            "error_message",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut stages = HashMap::new();
        for stage in Stage::stage_set(true) {
            let prefix = stage.as_str();
            let status_key = format!("{prefix}_status");
            if !fields.contains_key(&status_key) {
                continue;
            }
            let rec = StageRecord {
                status: parse_stage_status(fields.get(&status_key).map(String::as_str).unwrap_or("")),
                started_at: fields
                    .get(&format!("{prefix}_started_at"))
                    .and_then(|s| s.parse().ok()),
                completed_at: fields
                    .get(&format!("{prefix}_completed_at"))
                    .and_then(|s| s.parse().ok()),
                skipped: fields
                    .get(&format!("{prefix}_skipped"))
                    .map(|s| s == "true")
                    .unwrap_or(false),
                skip_reason: fields
                    .get(&format!("{prefix}_skip_reason"))
                    .filter(|s| !s.is_empty())
                    .cloned(),
            };
            stages.insert(*stage, rec);
            known.insert(status_key);
            known.insert(format!("{prefix}_started_at"));
            known.insert(format!("{prefix}_completed_at"));
            known.insert(format!("{prefix}_skipped"));
            known.insert(format!("{prefix}_skip_reason"));
        }

        let extra = fields
            .iter()
            .filter(|(k, _)| !known.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(LiveStatusRecord {
            request_id,
            video_id,
            status,
            generation_model: fields.get("generation_model").cloned().unwrap_or_default(),
            refinement_model: fields.get("refinement_model").cloned().unwrap_or_default(),
            config: fields.get("config").cloned().unwrap_or_default(),
            started_at,
            completed_at: fields
                .get("completed_at")
                .and_then(|s| if s.is_empty() { None } else { s.parse().ok() }),
            current_stage: fields
                .get("current_stage")
                .and_then(|s| parse_stage(s)),
            error_stage: fields.get("error_stage").and_then(|s| parse_stage(s)),
            error_message: fields
                .get("error_message")
                .filter(|s| !s.is_empty())
                .cloned(),
            stages,
            extra,
        })
    }
}

fn parse_status(s: &str) -> PipelineStatus {
    match s {
        "pending" => PipelineStatus::Pending,
        "processing" => PipelineStatus::Processing,
        "completed" => PipelineStatus::Completed,
        "failed" => PipelineStatus::Failed,
        "cancelled" => PipelineStatus::Cancelled,
        _ => PipelineStatus::Pending,
    }
}

fn parse_stage_status(s: &str) -> StageStatus {
    match s {
        "pending" => StageStatus::Pending,
        "processing" => StageStatus::Processing,
        "completed" => StageStatus::Completed,
        "skipped" => StageStatus::Skipped,
        "failed" => StageStatus::Failed,
        _ => StageStatus::Pending,
    }
}

fn parse_stage(s: &str) -> Option<Stage> {
    for stage in Stage::stage_set(true) {
        if stage.as_str() == s {
            return Some(*stage);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_top_level_fields_through_to_fields() {
        let rec = LiveStatusRecord::new(
            "pipeline:abc:123",
            "abc",
            "qwen3_vl_fp8",
            "qwen3_vl_fp8",
            "{}",
            100.0,
            crate::stage::FULL_STAGES,
        );
        let fields = rec.to_fields();
        assert_eq!(fields.get("status").unwrap(), "pending");
        assert_eq!(fields.get("download_status").unwrap(), "pending");
        assert_eq!(fields.get("completed_at").unwrap(), "");
    }

    #[test]
    fn from_fields_round_trips_to_fields() {
        let mut rec = LiveStatusRecord::new(
            "pipeline:abc:123",
            "abc",
            "qwen3_vl_fp8",
            "qwen3_vl_fp8",
            "{}",
            100.0,
            crate::stage::FULL_STAGES,
        );
        rec.status = PipelineStatus::Processing;
        rec.current_stage = Some(Stage::Audio);
        rec.extra.insert("audio_signed_url".into(), "https://x".into());
        if let Some(s) = rec.stages.get_mut(&Stage::Download) {
            s.status = StageStatus::Completed;
            s.completed_at = Some(105.0);
        }

        let fields = rec.to_fields();
        let restored = LiveStatusRecord::from_fields(&fields).expect("parses");

        assert_eq!(restored.status, PipelineStatus::Processing);
        assert_eq!(restored.current_stage, Some(Stage::Audio));
        assert_eq!(
            restored.extra.get("audio_signed_url").map(String::as_str),
            Some("https://x")
        );
        assert_eq!(
            restored.stages.get(&Stage::Download).unwrap().status,
            StageStatus::Completed
        );
        assert_eq!(
            restored.stages.get(&Stage::Download).unwrap().completed_at,
            Some(105.0)
        );
    }
}
