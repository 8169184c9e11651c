//! S2 `audio`: decode the video's audio track to WAV under the
//! `audio_extraction` global permit.

use clipflow_media::extract_audio;
use clipflow_models::VideoId;

use crate::concurrency::StageClass;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

use super::context::StageContext;

fn audio_path(ctx: &StageContext, video_id: &VideoId) -> std::path::PathBuf {
    ctx.video_work_dir(video_id.as_str()).join("audio.wav")
}

pub fn already_extracted(ctx: &StageContext, video_id: &VideoId) -> bool {
    audio_path(ctx, video_id).exists()
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, logger: &JobLogger) -> WorkerResult<()> {
    let _permit = ctx.limiter.acquire(StageClass::AudioExtraction).await;

    let work_dir = ctx.video_work_dir(video_id.as_str());
    tokio::fs::create_dir_all(&work_dir).await?;
    let input = work_dir.join("source.mp4");
    let output = audio_path(ctx, video_id);

    logger.log_start("extracting audio track");

    // The progress callback fires from the ffmpeg stdout reader, outside
    // this task. It marshals updates through a bounded channel rather than
    // touching the store directly; a single task here owns the KV write.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<f64>(8);
    let status = ctx.status.clone();
    let video_id_for_writer = video_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(pct) = rx.recv().await {
            let _ = status
                .set_progress_field(video_id_for_writer.as_str(), "audio_percentage", &pct.to_string())
                .await;
        }
    });

    let result = extract_audio(input.as_path(), output.as_path(), move |progress| {
        let _ = tx.try_send(progress.percentage(i64::MAX));
    })
    .await;

    writer.await.ok();
    result.map_err(|e| WorkerError::media_tool(e.to_string()))?;

    logger.log_completion("audio extracted");
    Ok(())
}
