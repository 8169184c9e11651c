//! The per-run orchestrator (C11): walks the selected stage list in order,
//! checking cancellation and skip rules between stages, per `spec.md` §4.7.

use clipflow_models::{PipelineConfig, PipelineStatus, RequestId, Stage, VideoId};

use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::stages::{self, StageContext};

pub struct RunOutcome {
    pub cancelled: bool,
    pub failed_stage: Option<Stage>,
}

impl RunOutcome {
    fn success() -> Self {
        Self { cancelled: false, failed_stage: None }
    }
    fn cancelled() -> Self {
        Self { cancelled: true, failed_stage: None }
    }
    fn failed(stage: Stage) -> Self {
        Self { cancelled: false, failed_stage: Some(stage) }
    }
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, request_id: &RequestId, mut config: PipelineConfig) -> WorkerResult<RunOutcome> {
    let model_config = ctx.models.get_config(config.refinement_model.as_str()).await?;
    let stages = Stage::stage_set(model_config.supports_video);

    ctx.status.update_pipeline_status(video_id.as_str(), PipelineStatus::Processing).await?;

    if !model_config.supports_video {
        config.include_video_refinement = false;
        ctx.status
            .mark_stage_skipped(video_id.as_str(), Stage::Clips, "Refinement model does not support video")
            .await?;
        ctx.status
            .mark_stage_skipped(video_id.as_str(), Stage::ClipUpload, "Refinement model does not support video")
            .await?;
    }

    for &stage in stages {
        if ctx.lock.check_cancellation(video_id.as_str()).await? {
            ctx.status.update_pipeline_status(video_id.as_str(), PipelineStatus::Cancelled).await?;
            ctx.lock.clear_cancellation(video_id.as_str()).await?;
            return Ok(RunOutcome::cancelled());
        }

        if let Some(reason) = should_skip(ctx, video_id, &config, stage).await? {
            ctx.status.mark_stage_skipped(video_id.as_str(), stage, &reason).await?;
            continue;
        }

        ctx.status.update_current_stage(video_id.as_str(), stage).await?;
        ctx.status.mark_stage_started(video_id.as_str(), stage).await?;

        let logger = JobLogger::new(video_id, request_id, stage);
        match run_stage(ctx, video_id, &config, stage, &logger).await {
            Ok(()) => {
                ctx.status.mark_stage_completed(video_id.as_str(), stage).await?;
            }
            Err(e) => {
                ctx.status.mark_stage_failed(video_id.as_str(), stage, &e.to_string()).await?;
                ctx.status.update_pipeline_status(video_id.as_str(), PipelineStatus::Failed).await?;
                return Ok(RunOutcome::failed(stage));
            }
        }

        ctx.lock.refresh_lock(video_id.as_str()).await?;
    }

    ctx.status.update_pipeline_status(video_id.as_str(), PipelineStatus::Completed).await?;
    Ok(RunOutcome::success())
}

async fn should_skip(ctx: &StageContext, video_id: &VideoId, config: &PipelineConfig, stage: Stage) -> WorkerResult<Option<String>> {
    let skip = match stage {
        Stage::Download => stages::download::already_downloaded(ctx, video_id, config.video_url.as_deref()).await?,
        Stage::Audio => stages::audio::already_extracted(ctx, video_id),
        Stage::AudioUpload => false,
        Stage::Transcript => stages::transcript::already_transcribed(ctx, video_id).await?,
        Stage::Generation => {
            let has_moments = stages::generation::already_generated(ctx, video_id).await?;
            has_moments && !config.override_existing_moments
        }
        Stage::Clips => {
            if stages::clips::already_clipped(ctx, video_id, config).await? {
                true
            } else {
                stages::clips::clear_existing_clips(ctx, video_id).await?;
                false
            }
        }
        Stage::ClipUpload => stages::clip_upload::already_uploaded(ctx, video_id, config).await?,
        Stage::Refinement => stages::refinement::nothing_to_refine(ctx, video_id, config).await?,
    };
    Ok(skip.then(|| "already satisfied".to_string()))
}

async fn run_stage(
    ctx: &StageContext,
    video_id: &VideoId,
    config: &PipelineConfig,
    stage: Stage,
    logger: &JobLogger,
) -> WorkerResult<()> {
    match stage {
        Stage::Download => {
            let url = config
                .video_url
                .as_deref()
                .ok_or_else(|| crate::error::WorkerError::resource_not_found("download stage reached with no video_url"))?;
            stages::download::run(ctx, video_id, url, logger).await
        }
        Stage::Audio => stages::audio::run(ctx, video_id, logger).await,
        Stage::AudioUpload => stages::audio_upload::run(ctx, video_id, logger).await,
        Stage::Transcript => stages::transcript::run(ctx, video_id, logger).await,
        Stage::Generation => stages::generation::run(ctx, video_id, config, logger).await,
        Stage::Clips => stages::clips::run(ctx, video_id, logger).await,
        Stage::ClipUpload => stages::clip_upload::run(ctx, video_id, logger).await,
        Stage::Refinement => stages::refinement::run(ctx, video_id, config, logger).await,
    }
}
