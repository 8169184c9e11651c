//! Per-model connection parameters, as registered in the model-config
//! registry (C4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the connector reaches a given model's host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelConnectionMode {
    Tunnel,
    Direct,
}

impl ModelConnectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelConnectionMode::Tunnel => "tunnel",
            ModelConnectionMode::Direct => "direct",
        }
    }
}

/// Registered connection parameters and capabilities for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_key: String,
    pub name: String,
    pub connection_mode: ModelConnectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_remote_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_local_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_remote_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    pub supports_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

/// Which wire contract a given call targets; selects the connector's
/// `api_path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiPath {
    Transcription,
    ChatCompletions,
}

impl ApiPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiPath::Transcription => "/transcribe",
            ApiPath::ChatCompletions => "/v1/chat/completions",
        }
    }
}

/// Built-in default model configs used to seed the registry on first start.
pub fn default_model_configs() -> Vec<ModelConfig> {
    let now = Utc::now();
    vec![
        ModelConfig {
            model_key: "qwen3_vl_fp8".to_string(),
            name: "Qwen3-VL FP8".to_string(),
            connection_mode: ModelConnectionMode::Tunnel,
            ssh_host: Some("gpu-host-1".to_string()),
            ssh_remote_host: Some("127.0.0.1".to_string()),
            ssh_local_port: Some(8901),
            ssh_remote_port: Some(8000),
            direct_host: None,
            direct_port: None,
            model_id: Some("qwen3-vl-fp8".to_string()),
            supports_video: true,
            top_p: Some(0.9),
            top_k: Some(40),
            updated_at: now,
        },
        ModelConfig {
            model_key: "minimax".to_string(),
            name: "Minimax".to_string(),
            connection_mode: ModelConnectionMode::Direct,
            ssh_host: None,
            ssh_remote_host: None,
            ssh_local_port: None,
            ssh_remote_port: None,
            direct_host: Some("minimax.internal".to_string()),
            direct_port: Some(8080),
            model_id: Some("minimax-text".to_string()),
            supports_video: false,
            top_p: None,
            top_k: None,
            updated_at: now,
        },
    ]
}
