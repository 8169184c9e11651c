//! S3 `audio_upload`: upload the extracted WAV and hand a signed URL to the
//! transcript stage via LiveStatus. Never skipped — the signed URL must be
//! fresh for every run.

use clipflow_models::VideoId;

use crate::error::WorkerResult;
use crate::logging::JobLogger;

use super::context::StageContext;

pub async fn run(ctx: &StageContext, video_id: &VideoId, logger: &JobLogger) -> WorkerResult<()> {
    let path = ctx.video_work_dir(video_id.as_str()).join("audio.wav");

    logger.log_start("uploading audio track");
    let key = ctx.storage.upload_audio(&path, video_id.as_str()).await?;
    let signed = ctx.storage.audio_signed_url(&key).await?;

    ctx.status
        .set_progress_field(video_id.as_str(), "audio_signed_url", &signed.url)
        .await?;

    logger.log_completion("audio uploaded, signed URL handed off");
    Ok(())
}
