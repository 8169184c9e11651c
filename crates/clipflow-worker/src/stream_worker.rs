//! Stream worker (C12): consumes `pipeline:requests` as consumer group
//! `pipeline_workers`, running the orchestrator for each claimed message.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clipflow_models::{PipelineConfig, RequestId, VideoId};
use clipflow_queue::{LockService, RequestStream, StreamMessage};
use tracing::{error, info, warn};

use crate::error::WorkerResult;
use crate::orchestrator;
use crate::stages::StageContext;

const READ_BLOCK_MS: u64 = 5_000;

pub struct StreamWorker {
    ctx: Arc<StageContext>,
    stream: RequestStream,
    lock: Arc<LockService>,
    consumer_name: String,
    running: Arc<AtomicBool>,
}

impl StreamWorker {
    pub fn new(ctx: Arc<StageContext>, stream: RequestStream, lock: Arc<LockService>, consumer_name: String) -> Self {
        Self {
            ctx,
            stream,
            lock,
            consumer_name,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Install SIGTERM/SIGINT handlers that flip `running` to false; the
    /// loop exits at the next iteration boundary rather than mid-stage.
    pub fn install_signal_handlers(&self) {
        let running = self.running.clone();
        tokio::spawn(async move {
            let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    error!("failed to install SIGTERM handler: {e}");
                    return;
                }
            };
            tokio::select! {
                _ = term.recv() => info!("received SIGTERM"),
                _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
            }
            running.store(false, Ordering::SeqCst);
        });
    }

    pub async fn run(&self) -> WorkerResult<()> {
        self.stream.ensure_group().await?;

        while self.running.load(Ordering::SeqCst) {
            let claimed = match self.stream.autoclaim_stale(&self.consumer_name, crate::config::STALE_CLAIM_IDLE_MS, 1).await {
                Ok(msgs) => msgs,
                Err(e) => {
                    error!("autoclaim failed: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let messages = if !claimed.is_empty() {
                claimed
            } else {
                match self.stream.read_new(&self.consumer_name, READ_BLOCK_MS, 1).await {
                    Ok(msgs) => msgs,
                    Err(e) => {
                        error!("stream read failed: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                }
            };

            for message in messages {
                if let Err(e) = self.process_message(&message).await {
                    error!(message_id = %message.id, "unexpected error processing message: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
                if let Err(e) = self.stream.ack(&message.id).await {
                    error!(message_id = %message.id, "ack failed: {e}");
                }
            }
        }

        info!("stream worker drained, exiting");
        Ok(())
    }

    async fn process_message(&self, message: &StreamMessage) -> WorkerResult<()> {
        let video_id = VideoId::from_string(message.video_id.clone());
        let request_id = RequestId::from_string(message.request_id.clone());

        let acquired = self.lock.acquire_lock(video_id.as_str(), request_id.as_str(), &self.consumer_name).await?;
        if !acquired {
            warn!(video_id = %video_id, "video already locked by another run, skipping without ack");
            return Ok(());
        }

        let config: PipelineConfig = serde_json::from_str(&message.config).unwrap_or_default();

        let run_result = orchestrator::run(&self.ctx, &video_id, &request_id, config).await;
        match &run_result {
            Ok(outcome) => {
                if outcome.cancelled {
                    info!(video_id = %video_id, "run cancelled");
                } else if let Some(stage) = outcome.failed_stage {
                    warn!(video_id = %video_id, %stage, "run failed");
                } else {
                    info!(video_id = %video_id, "run completed");
                }
            }
            Err(e) => error!(video_id = %video_id, "orchestrator error: {e}"),
        }

        if let Err(e) = self.ctx.status.archive_active_to_history(video_id.as_str()).await {
            error!(video_id = %video_id, "failed to archive status: {e}");
        }

        self.lock.release_lock(video_id.as_str()).await?;
        run_result.map(|_| ())
    }
}
