//! Video processing pipeline worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipflow_inference::{Connector, InferenceClient, TranscriptionClient};
use clipflow_models::default_model_configs;
use clipflow_queue::{KvClient, LockService, ModelRegistry, RequestStream, StatusService};
use clipflow_repo::{InMemoryMomentRepository, InMemoryTranscriptRepository, InMemoryVideoRepository};
use clipflow_storage::R2Client;
use clipflow_worker::{ConcurrencyLimiter, StageContext, StreamWorker, WorkerConfig};

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("clipflow=info".parse().unwrap()))
        .init();

    info!("starting clipflow-worker");

    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load worker config: {e}");
            std::process::exit(1);
        }
    };

    let kv = match KvClient::new(&config.redis_url) {
        Ok(kv) => kv,
        Err(e) => {
            error!("failed to connect to key-value store: {e}");
            std::process::exit(1);
        }
    };

    let models = Arc::new(ModelRegistry::new(kv.clone()));
    if let Err(e) = models.seed_from_defaults(&default_model_configs(), false).await {
        error!("failed to seed model registry: {e}");
        std::process::exit(1);
    }

    let storage = match R2Client::new(config.r2.clone()).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("failed to create object storage client: {e}");
            std::process::exit(1);
        }
    };

    let limiter = Arc::new(ConcurrencyLimiter::new(&config.concurrency));

    let ctx = Arc::new(StageContext {
        videos: Arc::new(InMemoryVideoRepository::default()),
        transcripts: Arc::new(InMemoryTranscriptRepository::default()),
        moments: Arc::new(InMemoryMomentRepository::default()),
        status: Arc::new(StatusService::new(kv.clone())),
        lock: Arc::new(LockService::new(kv.clone())),
        models,
        storage,
        connector: Arc::new(Connector::new()),
        transcription_client: Arc::new(TranscriptionClient::new()),
        inference_client: Arc::new(InferenceClient::new()),
        limiter,
        config,
    });

    let stream = RequestStream::new(kv);
    let lock = ctx.lock.clone();
    let consumer_name = format!("worker-{}", std::process::id());

    let worker = StreamWorker::new(ctx, stream, lock, consumer_name);
    worker.install_signal_handlers();

    if let Err(e) = worker.run().await {
        error!("stream worker error: {e}");
        std::process::exit(1);
    }

    info!("worker shutdown complete");
}
