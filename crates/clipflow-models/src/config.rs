//! Per-submission pipeline configuration and its validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Known generation/refinement models. Membership here does not imply a
/// registered [`crate::ModelConfig`] exists; that is checked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    Qwen3VlFp8,
    Minimax,
}

impl Default for ModelChoice {
    fn default() -> Self {
        ModelChoice::Qwen3VlFp8
    }
}

impl ModelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Qwen3VlFp8 => "qwen3_vl_fp8",
            ModelChoice::Minimax => "minimax",
        }
    }

    pub fn key(&self) -> crate::ModelKey {
        crate::ModelKey::from_string(self.as_str())
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options accepted on pipeline submission, per the external config
/// contract. Submission requires at least one of `video_id`/`video_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub force_download: bool,
    #[serde(default = "default_model")]
    pub generation_model: ModelChoice,
    #[serde(default = "default_model")]
    pub refinement_model: ModelChoice,
    #[serde(default = "default_temperature")]
    pub generation_temperature: f64,
    #[serde(default = "default_temperature")]
    pub refinement_temperature: f64,
    #[serde(default = "default_min_moment_length")]
    pub min_moment_length: f64,
    #[serde(default = "default_max_moment_length")]
    pub max_moment_length: f64,
    #[serde(default = "default_min_moments")]
    pub min_moments: u32,
    #[serde(default = "default_max_moments")]
    pub max_moments: u32,
    #[serde(default = "default_refinement_parallel_workers")]
    pub refinement_parallel_workers: u32,
    #[serde(default = "default_true")]
    pub include_video_refinement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_prompt: Option<String>,
    #[serde(default = "default_true")]
    pub override_existing_moments: bool,
    #[serde(default = "default_true")]
    pub override_existing_refinement: bool,
}

fn default_model() -> ModelChoice {
    ModelChoice::Qwen3VlFp8
}
fn default_temperature() -> f64 {
    0.7
}
fn default_min_moment_length() -> f64 {
    60.0
}
fn default_max_moment_length() -> f64 {
    120.0
}
fn default_min_moments() -> u32 {
    3
}
fn default_max_moments() -> u32 {
    10
}
fn default_refinement_parallel_workers() -> u32 {
    2
}
fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            video_id: None,
            video_url: None,
            force_download: false,
            generation_model: default_model(),
            refinement_model: default_model(),
            generation_temperature: default_temperature(),
            refinement_temperature: default_temperature(),
            min_moment_length: default_min_moment_length(),
            max_moment_length: default_max_moment_length(),
            min_moments: default_min_moments(),
            max_moments: default_max_moments(),
            refinement_parallel_workers: default_refinement_parallel_workers(),
            include_video_refinement: true,
            generation_prompt: None,
            override_existing_moments: true,
            override_existing_refinement: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("submission requires at least one of video_id or video_url")]
    MissingVideoIdentifier,
    #[error("video_id and video_url are mutually exclusive")]
    ConflictingVideoIdentifier,
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
        value: String,
    },
    #[error("max_moment_length ({max}) must be >= min_moment_length ({min})")]
    InvertedMomentLengthRange { min: f64, max: f64 },
    #[error("max_moments ({max}) must be >= min_moments ({min})")]
    InvertedMomentCountRange { min: u32, max: u32 },
}

impl PipelineConfig {
    /// Validate the submission-time contract from the external config
    /// fields. A failure here is a `ValidationFailed` error that surfaces at
    /// submission and never reaches the worker.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (&self.video_id, &self.video_url) {
            (None, None) => return Err(ValidationError::MissingVideoIdentifier),
            (Some(_), Some(_)) => return Err(ValidationError::ConflictingVideoIdentifier),
            _ => {}
        }

        check_range(
            "generation_temperature",
            self.generation_temperature,
            0.0,
            2.0,
        )?;
        check_range(
            "refinement_temperature",
            self.refinement_temperature,
            0.0,
            2.0,
        )?;
        check_range("min_moment_length", self.min_moment_length, 10.0, 300.0)?;
        check_range("max_moment_length", self.max_moment_length, 30.0, 600.0)?;
        check_range_u32("min_moments", self.min_moments, 1, 50)?;
        check_range_u32("max_moments", self.max_moments, 1, 100)?;
        check_range_u32(
            "refinement_parallel_workers",
            self.refinement_parallel_workers,
            1,
            5,
        )?;

        if self.max_moment_length < self.min_moment_length {
            return Err(ValidationError::InvertedMomentLengthRange {
                min: self.min_moment_length,
                max: self.max_moment_length,
            });
        }
        if self.max_moments < self.min_moments {
            return Err(ValidationError::InvertedMomentCountRange {
                min: self.min_moments,
                max: self.max_moments,
            });
        }

        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value < min || value > max {
        Err(ValidationError::OutOfRange {
            field,
            min: min.to_string(),
            max: max.to_string(),
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}

fn check_range_u32(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if value < min || value > max {
        Err(ValidationError::OutOfRange {
            field,
            min: min.to_string(),
            max: max.to_string(),
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> PipelineConfig {
        PipelineConfig {
            video_url: Some("https://example.com/a.mp4".into()),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_with_video_url_is_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_missing_identifier() {
        let cfg = PipelineConfig::default();
        assert_eq!(
            cfg.validate().unwrap_err(),
            ValidationError::MissingVideoIdentifier
        );
    }

    #[test]
    fn rejects_both_identifiers() {
        let mut cfg = base_config();
        cfg.video_id = Some("abc".into());
        assert_eq!(
            cfg.validate().unwrap_err(),
            ValidationError::ConflictingVideoIdentifier
        );
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut cfg = base_config();
        cfg.generation_temperature = 3.0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ValidationError::OutOfRange { field: "generation_temperature", .. }
        ));
    }

    #[test]
    fn rejects_inverted_moment_length_range() {
        let mut cfg = base_config();
        cfg.min_moment_length = 200.0;
        cfg.max_moment_length = 100.0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ValidationError::OutOfRange { .. } | ValidationError::InvertedMomentLengthRange { .. }
        ));
    }
}
