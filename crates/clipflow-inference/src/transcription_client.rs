//! HTTP client for the transcription service (S4).

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

use clipflow_models::{SegmentTimestamp, Transcript, WordTimestamp};

use crate::error::{InferenceError, InferenceResult};

const TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    transcription: String,
    word_timestamps: Vec<WordTimestampWire>,
    segment_timestamps: Vec<SegmentTimestampWire>,
}

#[derive(Debug, Deserialize)]
struct WordTimestampWire {
    word: String,
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct SegmentTimestampWire {
    start: f64,
    text: String,
}

pub struct TranscriptionClient {
    http: reqwest::Client,
}

impl Default for TranscriptionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptionClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// POST `audio_url` to the transcription endpoint and parse the result
    /// into a [`Transcript`].
    pub async fn transcribe(&self, model_key: &str, url: &str, audio_url: &str) -> InferenceResult<Transcript> {
        let started = Instant::now();
        let response = self
            .http
            .post(url)
            .timeout(TRANSCRIPTION_TIMEOUT)
            .json(&serde_json::json!({ "audio_url": audio_url }))
            .send()
            .await
            .map_err(|e| map_request_error(model_key, e, started))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RemoteServiceError {
                model_key: model_key.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| InferenceError::ParseError {
            model_key: model_key.to_string(),
            message: e.to_string(),
        })?;

        debug!(model_key, words = parsed.word_timestamps.len(), "received transcript");

        Ok(Transcript {
            text: parsed.transcription,
            words: parsed
                .word_timestamps
                .into_iter()
                .map(|w| WordTimestamp {
                    word: w.word,
                    start: w.start,
                    end: w.end,
                })
                .collect(),
            segments: parsed
                .segment_timestamps
                .into_iter()
                .map(|s| SegmentTimestamp {
                    start: s.start,
                    text: s.text,
                })
                .collect(),
        })
    }
}

fn map_request_error(model_key: &str, err: reqwest::Error, started: Instant) -> InferenceError {
    if err.is_timeout() {
        InferenceError::RemoteTimeout {
            model_key: model_key.to_string(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        }
    } else {
        InferenceError::RemoteServiceError {
            model_key: model_key.to_string(),
            message: err.to_string(),
        }
    }
}
