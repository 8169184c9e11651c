//! S8 `refinement`: re-run each moment's boundaries through the refinement
//! model, optionally given the clip itself, concurrently under the
//! `refinement` global permit.

use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};

use clipflow_inference::{decode_refinement, ChatMessage, TunnelPolicy};
use clipflow_models::{ApiPath, Moment, PipelineConfig, VideoId, WordTimestamp};

use crate::concurrency::StageClass;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

use super::align::{calculate_padded_boundaries, extract_words_in_range, normalize_words, DEFAULT_CLIP_PADDING_SECS, SEARCH_MARGIN_SECS};
use super::context::StageContext;

const PER_MOMENT_TIMEOUT: Duration = Duration::from_secs(600);

fn targets(moments: &[Moment], override_existing: bool) -> Vec<Moment> {
    moments
        .iter()
        .filter(|m| !m.is_refined && (override_existing || !already_has_refined_child(moments, &m.id)))
        .cloned()
        .collect()
}

fn already_has_refined_child(moments: &[Moment], parent_id: &str) -> bool {
    moments.iter().any(|m| m.is_refined && m.parent_id.as_deref() == Some(parent_id))
}

pub async fn nothing_to_refine(ctx: &StageContext, video_id: &VideoId, config: &PipelineConfig) -> WorkerResult<bool> {
    let moments = ctx.moments.list_by_video(video_id).await?;
    if moments.is_empty() {
        return Ok(true);
    }
    Ok(targets(&moments, config.override_existing_refinement).is_empty())
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, config: &PipelineConfig, logger: &JobLogger) -> WorkerResult<()> {
    let moments = ctx.moments.list_by_video(video_id).await?;
    let pending = targets(&moments, config.override_existing_refinement);
    let transcript = ctx.transcripts.get(video_id).await?;
    let video = ctx.videos.get(video_id).await?;
    let video_duration = video.as_ref().map(|v| v.duration_seconds).unwrap_or(f64::MAX);

    let model_config = ctx.models.get_config(config.refinement_model.as_str()).await?;
    let use_video = config.include_video_refinement && model_config.supports_video;

    let total = pending.len() as u32;
    ctx.status.update_refinement_progress(video_id.as_str(), total, 0, Some(0)).await?;
    logger.log_start(&format!("refining {total} moments"));

    let mut tasks = FuturesUnordered::new();
    for moment in pending {
        let ctx = ctx;
        let model_config = model_config.clone();
        let words = transcript.as_ref().map(|t| t.words.clone()).unwrap_or_default();
        let config = config.clone();
        tasks.push(async move {
            let _permit = ctx.limiter.acquire(StageClass::Refinement).await;
            let outcome = tokio::time::timeout(
                PER_MOMENT_TIMEOUT,
                refine_one(ctx, &moment, &words, video_duration, &model_config, use_video, &config),
            )
            .await;
            (moment, outcome)
        });
    }

    let mut processed = 0u32;
    let mut successful = 0u32;
    while let Some((moment, outcome)) = tasks.next().await {
        processed += 1;
        match outcome {
            Ok(Ok(refined)) => {
                ctx.moments.update_refinement(&moment.id, refined).await?;
                successful += 1;
            }
            Ok(Err(e)) => logger.log_warning(&format!("refinement failed for moment {}: {e}", moment.id)),
            Err(_) => logger.log_warning(&format!("refinement timed out for moment {}", moment.id)),
        }
        ctx.status
            .update_refinement_progress(video_id.as_str(), total, processed, Some(successful))
            .await?;
    }

    logger.log_completion(&format!("{successful}/{total} moments refined"));
    Ok(())
}

async fn refine_one(
    ctx: &StageContext,
    moment: &Moment,
    words: &[WordTimestamp],
    video_duration: f64,
    model_config: &clipflow_models::ModelConfig,
    use_video: bool,
    config: &PipelineConfig,
) -> WorkerResult<Moment> {
    let (window_start, window_end) = calculate_padded_boundaries(words, moment.start_time, moment.end_time, DEFAULT_CLIP_PADDING_SECS, SEARCH_MARGIN_SECS);
    let window_start = window_start.clamp(0.0, video_duration);
    let window_end = window_end.clamp(0.0, video_duration);

    let window_words = extract_words_in_range(words, window_start, window_end);
    let normalized = normalize_words(&window_words, window_start);

    let original_start = (moment.start_time - window_start).max(0.0);
    let original_end = (moment.end_time - window_start).max(0.0);

    let prompt = build_refinement_prompt(&moment.title, &normalized, original_start, original_end);

    let message = if use_video {
        if let Some(clip_url) = moment.cloud_url.as_deref() {
            ChatMessage::user_with_video(prompt, clip_url)
        } else {
            ChatMessage::user_text(prompt)
        }
    } else {
        ChatMessage::user_text(prompt)
    };

    let scope = ctx
        .connector
        .connect(model_config, ApiPath::ChatCompletions, TunnelPolicy::ReuseIfAccessible)
        .await?;

    let content = ctx
        .inference_client
        .complete(
            &model_config.model_key,
            &scope.url,
            vec![message],
            config.refinement_temperature,
            model_config.model_id.clone(),
            model_config.top_p,
            model_config.top_k,
            Some(PER_MOMENT_TIMEOUT),
        )
        .await?;

    let bounds = decode_refinement(&model_config.model_key, &content)?;

    let refined_start = (bounds.start_time + window_start).clamp(0.0, video_duration);
    let refined_end = (bounds.end_time + window_start).clamp(0.0, video_duration);

    Ok(moment.refined_child(refined_start, refined_end))
}

fn build_refinement_prompt(title: &str, words: &[WordTimestamp], original_start: f64, original_end: f64) -> String {
    let listing: String = words
        .iter()
        .map(|w| format!("[{:.2}-{:.2}] {}", w.start, w.end, w.word))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Refine the boundaries of the highlight moment titled \"{title}\".\n\
         Original boundaries (normalized to this window): start={original_start:.2}, end={original_end:.2}.\n\
         Word-level transcript of the window:\n{listing}\n\n\
         Respond with a single JSON object `{{\"start_time\": <seconds>, \"end_time\": <seconds>}}`, \
         in the window's normalized coordinates, with end_time > start_time."
    )
}
