//! SSH port-forward tunnel lifecycle for remote inference/transcription
//! hosts (C5).
//!
//! Grounded on the source's `TunnelManager`: `ssh -fN` forks into the
//! background and the parent process exits almost immediately, so there is
//! no long-lived child to hold onto — liveness is determined entirely by
//! probing the local port.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{info, warn};

use clipflow_models::ModelConfig;

use crate::error::{InferenceError, InferenceResult};

const PORT_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
const TUNNEL_VERIFY_TIMEOUT: Duration = Duration::from_secs(3);
const SSH_SPAWN_SETTLE: Duration = Duration::from_millis(500);
const SSH_ESTABLISH_WAIT: Duration = Duration::from_secs(2);

/// Which behavior to apply when a tunnel for this service key might already
/// exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelPolicy {
    /// If the local port is already reachable, treat it as live and hand
    /// back a handle without touching it. The orchestrator's default.
    ReuseIfAccessible,
    /// Kill whatever is bound to the local port and open a fresh tunnel
    /// against the current config, even if the old one was reachable.
    /// Needed when per-request config (e.g. `ssh_remote_host`) changed
    /// since the tunnel was opened.
    FreshCreate,
}

/// A live tunnel for one service key. Dropping this does not close the
/// underlying `ssh` process — tunnels persist across pipeline runs and are
/// torn down explicitly via [`TunnelManager::close`].
#[derive(Debug, Clone)]
pub struct TunnelHandle {
    pub service_key: String,
    pub local_port: u16,
    /// True if this call created the tunnel (as opposed to reusing one
    /// already accessible). Callers should only release tunnels they
    /// created themselves.
    pub freshly_created: bool,
}

/// Tracks which service keys this process believes it has an established
/// tunnel for. Safe to share across concurrent pipeline runs.
#[derive(Default)]
pub struct TunnelManager {
    known: Mutex<HashMap<String, TunnelHandle>>,
}

impl TunnelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a tunnel is available for `config`, applying `policy`.
    pub async fn ensure(&self, config: &ModelConfig, policy: TunnelPolicy) -> InferenceResult<TunnelHandle> {
        let local_port = config.ssh_local_port.ok_or_else(|| InferenceError::TunnelUnavailable {
            model_key: config.model_key.clone(),
            reason: "tunnel mode requires ssh_local_port".to_string(),
        })?;

        if policy == TunnelPolicy::FreshCreate {
            self.kill_local(config, local_port).await;
        } else {
            let mut known = self.known.lock().await;
            if let Some(handle) = known.get(&config.model_key) {
                if port_accessible(local_port, PORT_CHECK_TIMEOUT).await {
                    let mut handle = handle.clone();
                    handle.freshly_created = false;
                    return Ok(handle);
                }
                warn!(model_key = %config.model_key, "tracked tunnel no longer accessible, recreating");
                known.remove(&config.model_key);
            }
            drop(known);

            if port_accessible(local_port, PORT_CHECK_TIMEOUT).await {
                info!(model_key = %config.model_key, local_port, "reusing externally-accessible tunnel");
                let handle = TunnelHandle {
                    service_key: config.model_key.clone(),
                    local_port,
                    freshly_created: false,
                };
                self.known.lock().await.insert(config.model_key.clone(), handle.clone());
                return Ok(handle);
            }
        }

        self.create(config, local_port).await
    }

    async fn create(&self, config: &ModelConfig, local_port: u16) -> InferenceResult<TunnelHandle> {
        let ssh_host = config.ssh_host.as_deref().ok_or_else(|| InferenceError::TunnelUnavailable {
            model_key: config.model_key.clone(),
            reason: "tunnel mode requires ssh_host".to_string(),
        })?;
        let ssh_remote_host = config.ssh_remote_host.as_deref().unwrap_or("127.0.0.1");
        let remote_port = config.ssh_remote_port.ok_or_else(|| InferenceError::TunnelUnavailable {
            model_key: config.model_key.clone(),
            reason: "tunnel mode requires ssh_remote_port".to_string(),
        })?;

        info!(
            model_key = %config.model_key,
            "creating SSH tunnel: localhost:{local_port} -> {ssh_remote_host}:{remote_port} via {ssh_host}"
        );

        let output = Command::new("ssh")
            .arg("-fN")
            .args(["-o", "ExitOnForwardFailure=yes"])
            .args(["-o", "StrictHostKeyChecking=no"])
            .args(["-o", "ConnectTimeout=10"])
            .arg("-L")
            .arg(format!("{local_port}:{ssh_remote_host}:{remote_port}"))
            .arg(ssh_host)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr);

        if stderr.contains("Address already in use") || stderr.to_lowercase().contains("bind") {
            tokio::time::sleep(SSH_SPAWN_SETTLE * 2).await;
            if port_accessible(local_port, PORT_CHECK_TIMEOUT).await {
                info!(model_key = %config.model_key, "existing tunnel on port verified, reusing");
                return self.remember(config, local_port, false).await;
            }
            warn!(model_key = %config.model_key, "port in use but not accessible, treating as live anyway");
            return self.remember(config, local_port, false).await;
        }

        if !output.status.success() {
            return Err(InferenceError::TunnelUnavailable {
                model_key: config.model_key.clone(),
                reason: format!("ssh exited with {:?}: {}", output.status.code(), stderr.trim()),
            });
        }

        tokio::time::sleep(SSH_ESTABLISH_WAIT).await;

        if port_accessible(local_port, TUNNEL_VERIFY_TIMEOUT).await {
            self.remember(config, local_port, true).await
        } else {
            Err(InferenceError::TunnelUnavailable {
                model_key: config.model_key.clone(),
                reason: format!("port {local_port} not accessible after tunnel creation"),
            })
        }
    }

    async fn remember(&self, config: &ModelConfig, local_port: u16, freshly_created: bool) -> InferenceResult<TunnelHandle> {
        let handle = TunnelHandle {
            service_key: config.model_key.clone(),
            local_port,
            freshly_created,
        };
        self.known.lock().await.insert(config.model_key.clone(), handle.clone());
        Ok(handle)
    }

    /// Best-effort: kill whatever ssh process is bound to `local_port` for
    /// this service, ignoring failures (it may not exist).
    async fn kill_local(&self, config: &ModelConfig, local_port: u16) {
        self.known.lock().await.remove(&config.model_key);
        let pattern = format!("-L {local_port}:");
        let _ = Command::new("pkill")
            .arg("-f")
            .arg(pattern)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
    }

    /// Explicitly tear down the tunnel tracked for `service_key`, if any.
    pub async fn close(&self, service_key: &str) {
        if let Some(handle) = self.known.lock().await.remove(service_key) {
            let pattern = format!("-L {}:", handle.local_port);
            let _ = Command::new("pkill")
                .arg("-f")
                .arg(pattern)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
        }
    }
}

async fn port_accessible(port: u16, timeout: Duration) -> bool {
    tokio::time::timeout(timeout, TcpStream::connect(("127.0.0.1", port)))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn port_check_false_for_unbound_port() {
        assert!(!port_accessible(1, Duration::from_millis(50)).await);
    }
}
