//! S5 `generation`: prompt the chosen model for candidate moments, decode
//! and validate its response, persist the accepted set.

use std::time::Duration;

use clipflow_inference::{decode_moments, AiResponse, ChatMessage, TunnelPolicy};
use clipflow_models::{ApiPath, GenerationConfig, Moment, PipelineConfig, VideoId};

use crate::concurrency::StageClass;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

use super::context::StageContext;

/// Stage-level cap (`spec.md` §4.6 S5): the whole stage, including the
/// network call, must finish within this window.
const GENERATION_STAGE_TIMEOUT: Duration = Duration::from_secs(900);

pub async fn already_generated(ctx: &StageContext, video_id: &VideoId) -> WorkerResult<bool> {
    Ok(!ctx.moments.list_by_video(video_id).await?.is_empty())
}

pub async fn run(ctx: &StageContext, video_id: &VideoId, config: &PipelineConfig, logger: &JobLogger) -> WorkerResult<()> {
    let _permit = ctx.limiter.acquire(StageClass::MomentGeneration).await;

    let fut = run_inner(ctx, video_id, config, logger);
    tokio::time::timeout(GENERATION_STAGE_TIMEOUT, fut)
        .await
        .map_err(|_| WorkerError::stage_timeout("generation", GENERATION_STAGE_TIMEOUT.as_secs()))?
}

async fn run_inner(ctx: &StageContext, video_id: &VideoId, config: &PipelineConfig, logger: &JobLogger) -> WorkerResult<()> {
    let transcript = ctx
        .transcripts
        .get(video_id)
        .await?
        .ok_or_else(|| WorkerError::resource_not_found("transcript missing for generation stage"))?;

    let video = ctx
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| WorkerError::resource_not_found("video row missing for generation stage"))?;
    if video.duration_seconds <= 0.0 {
        return Err(WorkerError::resource_not_found("video duration_seconds is not positive"));
    }

    let model_key = config.generation_model.as_str();
    let model_config = ctx.models.get_config(model_key).await?;

    let prompt = build_prompt(config, &transcript.segment_pairs());
    let messages = vec![ChatMessage::user_text(prompt)];

    let scope = ctx
        .connector
        .connect(&model_config, ApiPath::ChatCompletions, TunnelPolicy::ReuseIfAccessible)
        .await?;

    logger.log_start("requesting moment generation");
    let content = ctx
        .inference_client
        .complete(
            model_key,
            &scope.url,
            messages,
            config.generation_temperature,
            model_config.model_id.clone(),
            model_config.top_p,
            model_config.top_k,
            None,
        )
        .await?;

    let decoded = decode_moments(model_key, &content)?;
    let moments = validate_and_select(&decoded, config, video.duration_seconds);

    if moments.is_empty() {
        return Err(WorkerError::ParseError("zero moments passed validation".to_string()));
    }
    if moments.len() < config.min_moments as usize {
        logger.log_warning(&format!(
            "generated only {} moments, below configured minimum {}",
            moments.len(),
            config.min_moments
        ));
    }

    let generation_config = GenerationConfig {
        model: config.generation_model,
        temperature: config.generation_temperature,
        min_moment_length: config.min_moment_length,
        max_moment_length: config.max_moment_length,
        min_moments: config.min_moments,
        max_moments: config.max_moments,
        prompt: config.generation_prompt.clone(),
    };

    ctx.moments.bulk_insert(video_id, &moments, &generation_config).await?;
    logger.log_completion(&format!("{} moments persisted", moments.len()));
    Ok(())
}

fn build_prompt(config: &PipelineConfig, segments: &[(f64, &str)]) -> String {
    let segment_listing: String = segments
        .iter()
        .map(|(start, text)| format!("[{start:.2}] {text}"))
        .collect::<Vec<_>>()
        .join("\n");

    let user_prompt = config
        .generation_prompt
        .clone()
        .unwrap_or_else(|| "Identify the most engaging highlight-worthy moments in this video.".to_string());

    format!(
        "{user_prompt}\n\n\
         The transcript below is a list of `[start_seconds] text` segments, in order.\n\
         Segments:\n{segment_listing}\n\n\
         Respond with a JSON array of objects `{{\"start_time\": <seconds>, \"end_time\": <seconds>, \"title\": <string>}}`.\n\
         Constraints: durations must be between {min_len:.0}s and {max_len:.0}s, moments must not overlap, \
         choose between {min_n} and {max_n} moments, and all timestamps must stay within [0, {duration:.1}] seconds.",
        min_len = config.min_moment_length,
        max_len = config.max_moment_length,
        min_n = config.min_moments,
        max_n = config.max_moments,
        duration = segments.last().map(|(s, _)| *s).unwrap_or(0.0),
    )
}

fn validate_and_select(decoded: &AiResponse, config: &PipelineConfig, video_duration: f64) -> Vec<Moment> {
    let mut candidates: Vec<Moment> = decoded
        .moments()
        .iter()
        .filter(|m| {
            m.start_time >= 0.0
                && m.end_time <= video_duration
                && m.end_time > m.start_time
                && {
                    let duration = m.end_time - m.start_time;
                    duration >= config.min_moment_length && duration <= config.max_moment_length
                }
        })
        .map(|m| Moment::new(m.start_time, m.end_time, m.title.clone()))
        .collect();

    candidates.sort_by(|a, b| a.start_time.partial_cmp(&b.start_time).unwrap_or(std::cmp::Ordering::Equal));

    let mut accepted: Vec<Moment> = Vec::new();
    for candidate in candidates {
        if accepted.iter().any(|m: &Moment| m.overlaps(&candidate)) {
            continue;
        }
        accepted.push(candidate);
    }

    accepted.truncate(config.max_moments as usize);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipflow_models::RawMoment;

    fn cfg() -> PipelineConfig {
        PipelineConfig {
            video_url: Some("https://example.com/a.mp4".into()),
            min_moment_length: 10.0,
            max_moment_length: 300.0,
            min_moments: 1,
            max_moments: 2,
            ..Default::default()
        }
    }

    #[test]
    fn drops_overlapping_and_truncates_to_max() {
        let raw = AiResponse::Array(vec![
            RawMoment { start_time: 0.0, end_time: 20.0, title: "a".into() },
            RawMoment { start_time: 15.0, end_time: 30.0, title: "b".into() },
            RawMoment { start_time: 40.0, end_time: 60.0, title: "c".into() },
            RawMoment { start_time: 70.0, end_time: 90.0, title: "d".into() },
        ]);
        let accepted = validate_and_select(&raw, &cfg(), 1000.0);
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].title, "a");
        assert_eq!(accepted[1].title, "c");
    }

    #[test]
    fn rejects_out_of_bounds_and_inverted_moments() {
        let raw = AiResponse::Array(vec![
            RawMoment { start_time: -1.0, end_time: 20.0, title: "neg".into() },
            RawMoment { start_time: 50.0, end_time: 40.0, title: "inverted".into() },
        ]);
        let accepted = validate_and_select(&raw, &cfg(), 1000.0);
        assert!(accepted.is_empty());
    }
}
