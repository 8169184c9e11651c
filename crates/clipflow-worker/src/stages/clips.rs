//! S6 `clips`: cut a word-boundary-aligned clip for every non-refined
//! moment, under the `clip_extraction` global permit.

use clipflow_media::extract_segment;
use clipflow_models::{Moment, PipelineConfig, VideoId};

use crate::concurrency::StageClass;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

use super::align::{calculate_padded_boundaries, DEFAULT_CLIP_PADDING_SECS, SEARCH_MARGIN_SECS};
use super::context::StageContext;

fn clip_path(ctx: &StageContext, video_id: &VideoId, moment_id: &str) -> std::path::PathBuf {
    ctx.video_work_dir(video_id.as_str()).join("clips").join(format!("{moment_id}.mp4"))
}

fn targets(moments: &[Moment]) -> Vec<&Moment> {
    moments.iter().filter(|m| !m.is_refined).collect()
}

pub async fn already_clipped(ctx: &StageContext, video_id: &VideoId, config: &PipelineConfig) -> WorkerResult<bool> {
    if config.override_existing_moments {
        return Ok(false);
    }
    let moments = ctx.moments.list_by_video(video_id).await?;
    let pending = targets(&moments);
    if pending.is_empty() {
        return Ok(true);
    }
    Ok(pending.iter().all(|m| clip_path(ctx, video_id, &m.id).exists()))
}

/// Delete local and remote clips for every moment, ahead of an
/// `override_existing_moments` re-run.
pub async fn clear_existing_clips(ctx: &StageContext, video_id: &VideoId) -> WorkerResult<()> {
    let clips_dir = ctx.video_work_dir(video_id.as_str()).join("clips");
    if clips_dir.exists() {
        tokio::fs::remove_dir_all(&clips_dir).await?;
    }
    let moments = ctx.moments.list_by_video(video_id).await?;
    let keys: Vec<String> = moments
        .iter()
        .filter_map(|m| m.clip_path.clone())
        .collect();
    if !keys.is_empty() {
        ctx.storage.delete_objects(&keys).await?;
    }
    Ok(())
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, logger: &JobLogger) -> WorkerResult<()> {
    let _permit = ctx.limiter.acquire(StageClass::ClipExtraction).await;

    let moments = ctx.moments.list_by_video(video_id).await?;
    let pending: Vec<Moment> = targets(&moments).into_iter().cloned().collect();
    let transcript = ctx.transcripts.get(video_id).await?;
    let video = ctx.videos.get(video_id).await?;
    let video_duration = video.as_ref().map(|v| v.duration_seconds).unwrap_or(f64::MAX);

    let source = ctx.video_work_dir(video_id.as_str()).join("source.mp4");
    let clips_dir = ctx.video_work_dir(video_id.as_str()).join("clips");
    tokio::fs::create_dir_all(&clips_dir).await?;

    let total = pending.len();
    let mut processed = 0u32;
    let mut failed = 0u32;

    logger.log_start(&format!("extracting {total} clips"));

    for moment in &pending {
        let (clip_start, clip_end) = match &transcript {
            Some(t) => calculate_padded_boundaries(&t.words, moment.start_time, moment.end_time, DEFAULT_CLIP_PADDING_SECS, SEARCH_MARGIN_SECS),
            None => (
                (moment.start_time - DEFAULT_CLIP_PADDING_SECS).max(0.0),
                moment.end_time + DEFAULT_CLIP_PADDING_SECS,
            ),
        };
        let clip_start = clip_start.clamp(0.0, video_duration);
        let clip_end = clip_end.clamp(0.0, video_duration);

        let output = clip_path(ctx, video_id, &moment.id);
        let result = extract_segment(source.as_path(), output.as_path(), clip_start, clip_end, |_progress| {}).await;

        match result {
            Ok(()) => processed += 1,
            Err(e) => {
                failed += 1;
                logger.log_warning(&format!("clip extraction failed for moment {}: {e}", moment.id));
            }
        }

        ctx.status
            .set_progress_field(video_id.as_str(), "clips_total", &total.to_string())
            .await?;
        ctx.status
            .set_progress_field(video_id.as_str(), "clips_processed", &processed.to_string())
            .await?;
        ctx.status
            .set_progress_field(video_id.as_str(), "clips_failed", &failed.to_string())
            .await?;
    }

    logger.log_completion(&format!("{processed}/{total} clips extracted ({failed} failed)"));
    Ok(())
}
