//! Moments: `(start_time, end_time, title)` triples inside a video,
//! optionally refined children of an original moment.

use serde::{Deserialize, Serialize};

use crate::config::ModelChoice;
use crate::ids::moment_id;

/// A single highlight-worthy span inside a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub title: String,
    #[serde(default)]
    pub is_refined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_url: Option<String>,
}

impl Moment {
    pub fn new(start_time: f64, end_time: f64, title: impl Into<String>) -> Self {
        Self {
            id: moment_id(start_time, end_time),
            start_time,
            end_time,
            title: title.into(),
            is_refined: false,
            parent_id: None,
            clip_path: None,
            cloud_url: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn overlaps(&self, other: &Moment) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    /// Build the refined sibling of this moment, recomputing its id from
    /// the (possibly adjusted) boundaries.
    pub fn refined_child(&self, start_time: f64, end_time: f64) -> Moment {
        Moment {
            id: moment_id(start_time, end_time),
            start_time,
            end_time,
            title: self.title.clone(),
            is_refined: true,
            parent_id: Some(self.id.clone()),
            clip_path: None,
            cloud_url: None,
        }
    }
}

/// Generation-time parameters snapshotted alongside persisted moments, so a
/// later read can explain how a batch of moments was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: ModelChoice,
    pub temperature: f64,
    pub min_moment_length: f64,
    pub max_moment_length: f64,
    pub min_moments: u32,
    pub max_moments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            temperature: 0.7,
            min_moment_length: 60.0,
            max_moment_length: 120.0,
            min_moments: 3,
            max_moments: 10,
            prompt: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_detection() {
        let a = Moment::new(0.0, 10.0, "a");
        let b = Moment::new(9.0, 20.0, "b");
        let c = Moment::new(10.0, 20.0, "c");
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn refined_child_points_at_parent() {
        let parent = Moment::new(5.0, 65.0, "parent");
        let child = parent.refined_child(10.0, 60.0);
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));
        assert!(child.is_refined);
    }
}
