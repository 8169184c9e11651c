//! In-memory repository implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use clipflow_models::{GenerationConfig, Moment, Transcript, VideoId, VideoRecord};

use crate::error::RepoResult;
use crate::traits::{MomentRepository, TranscriptRepository, VideoRepository};

#[derive(Default)]
pub struct InMemoryVideoRepository {
    rows: Mutex<HashMap<String, VideoRecord>>,
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get(&self, video_id: &VideoId) -> RepoResult<Option<VideoRecord>> {
        Ok(self.rows.lock().unwrap().get(video_id.as_str()).cloned())
    }

    async fn get_by_source_url(&self, source_url: &str) -> RepoResult<Option<VideoRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|v| v.source_url == source_url)
            .cloned())
    }

    async fn create(&self, video: &VideoRecord) -> RepoResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(video.video_id.as_str().to_string(), video.clone());
        Ok(())
    }

    async fn update_metadata(
        &self,
        video_id: &VideoId,
        duration_seconds: f64,
        width: u32,
        height: u32,
        fps: f64,
        codec: &str,
        size_bytes: u64,
        bitrate: u64,
    ) -> RepoResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(video_id.as_str()) {
            row.duration_seconds = duration_seconds;
            row.width = width;
            row.height = height;
            row.fps = fps;
            row.codec = codec.to_string();
            row.size_bytes = size_bytes;
            row.bitrate = bitrate;
            row.updated_at = chrono::Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTranscriptRepository {
    rows: Mutex<HashMap<String, Transcript>>,
}

#[async_trait]
impl TranscriptRepository for InMemoryTranscriptRepository {
    async fn get(&self, video_id: &VideoId) -> RepoResult<Option<Transcript>> {
        Ok(self.rows.lock().unwrap().get(video_id.as_str()).cloned())
    }

    async fn create(&self, video_id: &VideoId, transcript: &Transcript) -> RepoResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(video_id.as_str().to_string(), transcript.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMomentRepository {
    moments: Mutex<HashMap<String, Vec<Moment>>>,
}

#[async_trait]
impl MomentRepository for InMemoryMomentRepository {
    async fn list_by_video(&self, video_id: &VideoId) -> RepoResult<Vec<Moment>> {
        Ok(self
            .moments
            .lock()
            .unwrap()
            .get(video_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn bulk_insert(
        &self,
        video_id: &VideoId,
        moments: &[Moment],
        _generation_config: &GenerationConfig,
    ) -> RepoResult<()> {
        self.moments
            .lock()
            .unwrap()
            .entry(video_id.as_str().to_string())
            .or_default()
            .extend_from_slice(moments);
        Ok(())
    }

    async fn delete_unrefined(&self, video_id: &VideoId) -> RepoResult<()> {
        if let Some(list) = self.moments.lock().unwrap().get_mut(video_id.as_str()) {
            list.retain(|m| m.is_refined);
        }
        Ok(())
    }

    async fn update_clip_path(&self, moment_id: &str, clip_path: &str, cloud_url: &str) -> RepoResult<()> {
        for list in self.moments.lock().unwrap().values_mut() {
            if let Some(m) = list.iter_mut().find(|m| m.id == moment_id) {
                m.clip_path = Some(clip_path.to_string());
                m.cloud_url = Some(cloud_url.to_string());
            }
        }
        Ok(())
    }

    async fn update_refinement(&self, moment_id: &str, refined: Moment) -> RepoResult<()> {
        for list in self.moments.lock().unwrap().values_mut() {
            if let Some(slot) = list.iter_mut().find(|m| m.id == moment_id) {
                *slot = refined;
                return Ok(());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipflow_models::generate_video_id;

    #[tokio::test]
    async fn video_round_trips_by_source_url() {
        let repo = InMemoryVideoRepository::default();
        let video_id = VideoId::from_string(generate_video_id("https://youtu.be/abc"));
        let record = VideoRecord::new(video_id.clone(), "https://youtu.be/abc", "https://cdn/abc.mp4");
        repo.create(&record).await.unwrap();

        let found = repo.get_by_source_url("https://youtu.be/abc").await.unwrap();
        assert_eq!(found.unwrap().video_id, video_id);
    }

    #[tokio::test]
    async fn delete_unrefined_keeps_refined_moments() {
        let repo = InMemoryMomentRepository::default();
        let video_id = VideoId::from_string("vid-1".to_string());
        let m1 = Moment::new(0.0, 10.0, "a".to_string());
        let mut m2 = Moment::new(20.0, 30.0, "b".to_string());
        m2.is_refined = true;
        let gen_config = GenerationConfig::default();

        repo.bulk_insert(&video_id, &[m1, m2.clone()], &gen_config).await.unwrap();
        repo.delete_unrefined(&video_id).await.unwrap();

        let remaining = repo.list_by_video(&video_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, m2.id);
    }
}
