//! S1 `download`: fetch the source video, probe it, upload it, and insert
//! its `videos` row.

use clipflow_media::{download_video, probe_video};
use clipflow_models::{generate_video_id, VideoId, VideoRecord};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

use super::context::StageContext;

/// Resolve the video id for this run: the caller-supplied one, or one
/// derived from `video_url`.
pub fn resolve_video_id(video_id: Option<&str>, video_url: Option<&str>) -> WorkerResult<VideoId> {
    if let Some(id) = video_id {
        return Ok(VideoId::from_string(id));
    }
    let url = video_url.ok_or_else(|| WorkerError::resource_not_found("submission has neither video_id nor video_url"))?;
    Ok(generate_video_id(url))
}

/// Returns `true` if the download stage should be skipped because the
/// video already exists in the repository.
pub async fn already_downloaded(ctx: &StageContext, video_id: &VideoId, video_url: Option<&str>) -> WorkerResult<bool> {
    if ctx.videos.get(video_id).await?.is_some() {
        return Ok(true);
    }
    if let Some(url) = video_url {
        if ctx.videos.get_by_source_url(url).await?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, video_url: &str, logger: &JobLogger) -> WorkerResult<()> {
    let work_dir = ctx.video_work_dir(video_id.as_str());
    tokio::fs::create_dir_all(&work_dir).await?;
    let local_path = work_dir.join("source.mp4");

    logger.log_start(&format!("downloading {video_url}"));

    let result = run_inner(ctx, video_id, video_url, &local_path, logger).await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&local_path).await;
    }

    result
}

async fn run_inner(
    ctx: &StageContext,
    video_id: &VideoId,
    video_url: &str,
    local_path: &std::path::Path,
    logger: &JobLogger,
) -> WorkerResult<()> {
    download_video(video_url, local_path)
        .await
        .map_err(|e| WorkerError::media_tool(e.to_string()))?;

    ctx.status
        .set_progress_field(video_id.as_str(), "download_percentage", "100")
        .await?;

    let info = probe_video(local_path).await.map_err(|e| WorkerError::media_tool(e.to_string()))?;
    logger.log_progress(&format!("probed duration={:.1}s", info.duration));

    let key = ctx.storage.upload_video(local_path, video_id.as_str()).await?;
    let cloud_url = format!("{}/{}", ctx.config.r2.bucket_name, key);

    let mut record = VideoRecord::new(video_id.clone(), video_url, cloud_url);
    record.duration_seconds = info.duration;
    record.width = info.width;
    record.height = info.height;
    record.fps = info.fps;
    record.codec = info.codec;
    record.size_bytes = info.size;
    record.bitrate = info.bitrate;

    ctx.videos.create(&record).await?;
    logger.log_completion("video ingested");
    Ok(())
}
