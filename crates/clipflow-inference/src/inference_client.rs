//! HTTP client for generation/refinement model calls (S5, S8).

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{InferenceError, InferenceResult};

const GENERATION_TIMEOUT: Duration = Duration::from_secs(600);
const GENERATION_MAX_TOKENS: u32 = 15_000;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Value,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Value::String(text.into()),
        }
    }

    /// A multimodal user message embedding a clip URL alongside text, for
    /// video-capable refinement models (S8).
    pub fn user_with_video(text: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: serde_json::json!([
                { "type": "text", "text": text.into() },
                { "type": "video_url", "video_url": { "url": video_url.into() } },
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

pub struct InferenceClient {
    http: reqwest::Client,
}

impl Default for InferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// POST a chat-completions request to `url`; returns the first choice's
    /// raw assistant content (undecoded — see [`crate::decode`]).
    #[allow(clippy::too_many_arguments)]
    pub async fn complete(
        &self,
        model_key: &str,
        url: &str,
        messages: Vec<ChatMessage>,
        temperature: f64,
        model: Option<String>,
        top_p: Option<f64>,
        top_k: Option<u32>,
        timeout: Option<Duration>,
    ) -> InferenceResult<String> {
        let request = ChatRequest {
            messages,
            max_tokens: GENERATION_MAX_TOKENS,
            temperature,
            model,
            top_p,
            top_k,
        };

        let started = Instant::now();
        let response = self
            .http
            .post(url)
            .timeout(timeout.unwrap_or(GENERATION_TIMEOUT))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_request_error(model_key, e, started))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model_key, %status, "generation endpoint returned error status");
            return Err(InferenceError::RemoteServiceError {
                model_key: model_key.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| InferenceError::ParseError {
            model_key: model_key.to_string(),
            message: e.to_string(),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| InferenceError::ParseError {
                model_key: model_key.to_string(),
                message: "response had no choices".to_string(),
            })?;

        debug!(model_key, bytes = content.len(), "received generation response");
        Ok(content)
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
