//! S7 `clip_upload`: upload every produced clip and write its path back
//! onto the moment record.

use clipflow_models::{Moment, PipelineConfig, VideoId};

use crate::error::WorkerResult;
use crate::logging::JobLogger;

use super::context::StageContext;

pub async fn already_uploaded(ctx: &StageContext, video_id: &VideoId, config: &PipelineConfig) -> WorkerResult<bool> {
    if config.override_existing_moments {
        return Ok(false);
    }
    let moments = ctx.moments.list_by_video(video_id).await?;
    let pending: Vec<&Moment> = moments.iter().filter(|m| !m.is_refined).collect();
    Ok(!pending.is_empty() && pending.iter().all(|m| m.cloud_url.is_some()))
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, logger: &JobLogger) -> WorkerResult<()> {
    let moments = ctx.moments.list_by_video(video_id).await?;
    let pending: Vec<Moment> = moments.into_iter().filter(|m| !m.is_refined).collect();

    let mut cumulative_bytes: u64 = 0;
    logger.log_start(&format!("uploading {} clips", pending.len()));

    for moment in &pending {
        let path = ctx
            .video_work_dir(video_id.as_str())
            .join("clips")
            .join(format!("{}.mp4", moment.id));
        if !path.exists() {
            continue;
        }

        let key = ctx.storage.upload_clip(&path, video_id.as_str(), &moment.id).await?;
        let cloud_url = format!("{}/{}", ctx.config.r2.bucket_name, key);
        ctx.moments.update_clip_path(&moment.id, &key, &cloud_url).await?;

        if let Ok(meta) = tokio::fs::metadata(&path).await {
            cumulative_bytes += meta.len();
        }
        ctx.status
            .set_progress_field(video_id.as_str(), "clip_upload_bytes", &cumulative_bytes.to_string())
            .await?;
    }

    logger.log_completion(&format!("{} clips uploaded", pending.len()));
    Ok(())
}
