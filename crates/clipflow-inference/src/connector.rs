//! Uniform acquire/release scope for a model's reachable endpoint (C6).
//!
//! Grounded on the source's `get_service_url`/`connect`: direct mode is a
//! no-op URL computation, tunnel mode delegates to the tunnel manager. The
//! core spec standardizes on always-fresh at this boundary (see
//! `spec.md` §9 open questions), while still honoring explicit
//! reuse-if-accessible callers.

use std::sync::Arc;

use tracing::info;

use clipflow_models::{ApiPath, ModelConfig, ModelConnectionMode};

use crate::error::{InferenceError, InferenceResult};
use crate::tunnel::{TunnelManager, TunnelPolicy};

/// A connection scope: the URL to call, plus (if a tunnel was opened) the
/// guard that tears it down on drop if this call created it.
pub struct ConnectionScope {
    pub url: String,
    guard: Option<TunnelGuard>,
}

struct TunnelGuard {
    manager: Arc<TunnelManager>,
    service_key: String,
    release_on_drop: bool,
}

impl Drop for TunnelGuard {
    fn drop(&mut self) {
        if self.release_on_drop {
            let manager = self.manager.clone();
            let service_key = self.service_key.clone();
            tokio::spawn(async move {
                manager.close(&service_key).await;
            });
        }
    }
}

pub struct Connector {
    tunnels: Arc<TunnelManager>,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector {
    pub fn new() -> Self {
        Self {
            tunnels: Arc::new(TunnelManager::new()),
        }
    }

    /// Compute the URL for `config`/`api_path` without opening anything —
    /// used for logging and tests.
    pub fn service_url(config: &ModelConfig, api_path: ApiPath) -> InferenceResult<String> {
        let path = api_path.as_str();
        let url = match config.connection_mode {
            ModelConnectionMode::Direct => {
                let host = config.direct_host.as_deref().ok_or_else(|| InferenceError::UnknownModel(config.model_key.clone()))?;
                let port = config.direct_port.ok_or_else(|| InferenceError::UnknownModel(config.model_key.clone()))?;
                format!("http://{host}:{port}{path}")
            }
            ModelConnectionMode::Tunnel => {
                let port = config.ssh_local_port.ok_or_else(|| InferenceError::TunnelUnavailable {
                    model_key: config.model_key.clone(),
                    reason: "tunnel mode requires ssh_local_port".to_string(),
                })?;
                format!("http://localhost:{port}{path}")
            }
        };
        Ok(url)
    }

    /// Open a connection scope for `config`. Direct mode never touches the
    /// tunnel manager; tunnel mode ensures a tunnel per `policy`.
    pub async fn connect(&self, config: &ModelConfig, api_path: ApiPath, policy: TunnelPolicy) -> InferenceResult<ConnectionScope> {
        let url = Self::service_url(config, api_path)?;

        if config.connection_mode == ModelConnectionMode::Direct {
            info!(model_key = %config.model_key, "direct connection mode, no tunnel needed");
            return Ok(ConnectionScope { url, guard: None });
        }

        let handle = self.tunnels.ensure(config, policy).await?;
        let guard = TunnelGuard {
            manager: self.tunnels.clone(),
            service_key: config.model_key.clone(),
            release_on_drop: handle.freshly_created,
        };
        Ok(ConnectionScope {
            url,
            guard: Some(guard),
        })
    }
}

impl ConnectionScope {
    #[cfg(test)]
    fn holds_tunnel(&self) -> bool {
        self.guard.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn direct_config() -> ModelConfig {
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
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn direct_mode_url_uses_host_and_port() {
        let url = Connector::service_url(&direct_config(), ApiPath::ChatCompletions).unwrap();
        assert_eq!(url, "http://minimax.internal:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn direct_mode_connect_holds_no_tunnel() {
        let connector = Connector::new();
        let scope = connector
            .connect(&direct_config(), ApiPath::ChatCompletions, TunnelPolicy::ReuseIfAccessible)
            .await
            .unwrap();
        assert!(!scope.holds_tunnel());
    }
}
