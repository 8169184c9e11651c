//! Per-video object-store layout and upload operations used by the stage
//! executors (S1 video ingest, S3 audio upload, S7 clip upload).

use std::path::Path;

use tracing::info;

use crate::client::R2Client;
use crate::error::StorageResult;

fn video_key(video_id: &str) -> String {
    format!("{video_id}/original.mp4")
}

fn audio_key(video_id: &str) -> String {
    format!("{video_id}/audio.wav")
}

fn clip_key(video_id: &str, moment_id: &str) -> String {
    format!("{video_id}/clips/{moment_id}.mp4")
}

impl R2Client {
    /// Upload the downloaded source video (S1). Returns the object key.
    pub async fn upload_video(&self, path: impl AsRef<Path>, video_id: &str) -> StorageResult<String> {
        let key = video_key(video_id);
        self.upload_file(path, &key, "video/mp4").await?;
        info!(video_id, key, "uploaded source video");
        Ok(key)
    }

    /// Upload the extracted audio track (S3). Returns the object key.
    pub async fn upload_audio(&self, path: impl AsRef<Path>, video_id: &str) -> StorageResult<String> {
        let key = audio_key(video_id);
        self.upload_file(path, &key, "audio/wav").await?;
        info!(video_id, key, "uploaded audio track");
        Ok(key)
    }

    /// Upload one extracted clip (S7). Returns the object key.
    pub async fn upload_clip(
        &self,
        path: impl AsRef<Path>,
        video_id: &str,
        moment_id: &str,
    ) -> StorageResult<String> {
        let key = clip_key(video_id, moment_id);
        self.upload_file(path, &key, "video/mp4").await?;
        info!(video_id, moment_id, key, "uploaded clip");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_is_deterministic() {
        assert_eq!(video_key("vid-1"), "vid-1/original.mp4");
        assert_eq!(audio_key("vid-1"), "vid-1/audio.wav");
        assert_eq!(clip_key("vid-1", "m-abc"), "vid-1/clips/m-abc.mp4");
    }
}
