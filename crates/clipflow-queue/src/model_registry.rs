//! Model-config registry (C4): per-model connection parameters and
//! capabilities, seedable from built-in defaults.

use chrono::Utc;
use clipflow_models::{ModelConfig, ModelConnectionMode};

use crate::error::{QueueError, QueueResult};
use crate::kv::KvClient;

const KEYS_SET: &str = "model:config:_keys";

fn config_key(model_key: &str) -> String {
    format!("model:config:{model_key}")
}

pub struct ModelRegistry {
    kv: KvClient,
}

impl ModelRegistry {
    pub fn new(kv: KvClient) -> Self {
        Self { kv }
    }

    pub async fn get_config(&self, model_key: &str) -> QueueResult<ModelConfig> {
        let fields = self.kv.hgetall(&config_key(model_key)).await?;
        if fields.is_empty() {
            let available = self.get_registered_keys().await?;
            return Err(QueueError::ModelConfigNotFound {
                model_key: model_key.to_string(),
                available,
            });
        }
        Ok(deserialize_config(model_key, &fields))
    }

    pub async fn set_config(&self, config: &ModelConfig) -> QueueResult<()> {
        let fields = serialize_config(config);
        self.kv.hset_multiple(&config_key(&config.model_key), &fields).await?;
        self.kv.sadd(KEYS_SET, &config.model_key).await?;
        Ok(())
    }

    pub async fn delete_config(&self, model_key: &str) -> QueueResult<bool> {
        let exists = self.kv.exists(&config_key(model_key)).await?;
        if exists {
            self.kv.del(&config_key(model_key)).await?;
            self.kv.srem(KEYS_SET, model_key).await?;
        }
        Ok(exists)
    }

    pub async fn get_registered_keys(&self) -> QueueResult<Vec<String>> {
        let mut keys = self.kv.smembers(KEYS_SET).await?;
        keys.sort();
        Ok(keys)
    }

    pub async fn list_configs(&self) -> QueueResult<Vec<ModelConfig>> {
        let keys = self.get_registered_keys().await?;
        let mut configs = Vec::with_capacity(keys.len());
        for key in keys {
            if let Ok(cfg) = self.get_config(&key).await {
                configs.push(cfg);
            }
        }
        Ok(configs)
    }

    /// Seed the registry from the built-in defaults. Existing configs are
    /// left untouched unless `force` is set.
    pub async fn seed_from_defaults(&self, defaults: &[ModelConfig], force: bool) -> QueueResult<usize> {
        let mut count = 0;
        for config in defaults {
            let exists = self.kv.exists(&config_key(&config.model_key)).await?;
            if !exists || force {
                self.set_config(config).await?;
                count += 1;
            }
        }
        Ok(count)
    }
}

fn serialize_config(config: &ModelConfig) -> std::collections::HashMap<String, String> {
    use std::collections::HashMap;
    let mut fields = HashMap::new();
    fields.insert("name".to_string(), config.name.clone());
    fields.insert(
        "connection_mode".to_string(),
        config.connection_mode.as_str().to_string(),
    );
    fields.insert("ssh_host".to_string(), config.ssh_host.clone().unwrap_or_default());
    fields.insert(
        "ssh_remote_host".to_string(),
        config.ssh_remote_host.clone().unwrap_or_default(),
    );
    fields.insert(
        "ssh_local_port".to_string(),
        config.ssh_local_port.map(|p| p.to_string()).unwrap_or_default(),
    );
    fields.insert(
        "ssh_remote_port".to_string(),
        config.ssh_remote_port.map(|p| p.to_string()).unwrap_or_default(),
    );
    fields.insert(
        "direct_host".to_string(),
        config.direct_host.clone().unwrap_or_default(),
    );
    fields.insert(
        "direct_port".to_string(),
        config.direct_port.map(|p| p.to_string()).unwrap_or_default(),
    );
    fields.insert("model_id".to_string(), config.model_id.clone().unwrap_or_default());
    fields.insert(
        "supports_video".to_string(),
        if config.supports_video { "true".to_string() } else { "false".to_string() },
    );
    fields.insert("top_p".to_string(), config.top_p.map(|v| v.to_string()).unwrap_or_default());
    fields.insert("top_k".to_string(), config.top_k.map(|v| v.to_string()).unwrap_or_default());
    fields.insert("updated_at".to_string(), Utc::now().to_rfc3339());
    fields
}

fn deserialize_config(model_key: &str, fields: &std::collections::HashMap<String, String>) -> ModelConfig {
    let get = |k: &str| fields.get(k).filter(|v| !v.is_empty()).cloned();
    ModelConfig {
        model_key: model_key.to_string(),
        name: fields.get("name").cloned().unwrap_or_default(),
        connection_mode: match fields.get("connection_mode").map(String::as_str) {
            Some("direct") => ModelConnectionMode::Direct,
            _ => ModelConnectionMode::Tunnel,
        },
        ssh_host: get("ssh_host"),
        ssh_remote_host: get("ssh_remote_host"),
        ssh_local_port: get("ssh_local_port").and_then(|v| v.parse().ok()),
        ssh_remote_port: get("ssh_remote_port").and_then(|v| v.parse().ok()),
        direct_host: get("direct_host"),
        direct_port: get("direct_port").and_then(|v| v.parse().ok()),
        model_id: get("model_id"),
        supports_video: fields
            .get("supports_video")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        top_p: get("top_p").and_then(|v| v.parse().ok()),
        top_k: get("top_k").and_then(|v| v.parse().ok()),
        updated_at: fields
            .get("updated_at")
            .and_then(|v| chrono::DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
    }
}
