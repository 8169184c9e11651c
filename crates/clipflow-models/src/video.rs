//! The persisted video row, as inserted/read by the relational repository
//! layer (S1 download, traits only — see `clipflow-repo`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::VideoId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: VideoId,
    pub source_url: String,
    pub cloud_url: String,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
    pub size_bytes: u64,
    pub bitrate: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(video_id: VideoId, source_url: impl Into<String>, cloud_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            video_id,
            source_url: source_url.into(),
            cloud_url: cloud_url.into(),
            duration_seconds: 0.0,
            width: 0,
            height: 0,
            fps: 0.0,
            codec: String::new(),
            size_bytes: 0,
            bitrate: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
