//! S4 `transcript`: POST the handoff audio URL to the transcription model
//! and persist the result.

use clipflow_models::{ApiPath, VideoId};

use crate::concurrency::StageClass;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

use super::context::StageContext;

const TRANSCRIPTION_MODEL_KEY: &str = "qwen3_vl_fp8";

pub async fn already_transcribed(ctx: &StageContext, video_id: &VideoId) -> WorkerResult<bool> {
    Ok(ctx.transcripts.get(video_id).await?.is_some())
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, logger: &JobLogger) -> WorkerResult<()> {
    let _permit = ctx.limiter.acquire(StageClass::Transcription).await;

    let audio_url = ctx
        .status
        .get_progress_field(video_id.as_str(), "audio_signed_url")
        .await?
        .ok_or_else(|| WorkerError::resource_not_found("audio_signed_url missing from LiveStatus"))?;

    let model_config = ctx.models.get_config(TRANSCRIPTION_MODEL_KEY).await?;
    let scope = ctx
        .connector
        .connect(&model_config, ApiPath::Transcription, clipflow_inference::TunnelPolicy::ReuseIfAccessible)
        .await?;

    logger.log_start("requesting transcription");
    let transcript = ctx
        .transcription_client
        .transcribe(TRANSCRIPTION_MODEL_KEY, &scope.url, &audio_url)
        .await?;

    ctx.transcripts.create(video_id, &transcript).await?;
    logger.log_completion(&format!("transcript persisted ({} words)", transcript.words.len()));
    Ok(())
}
