//! Key-value store / control-plane integration tests. Require a live Redis
//! instance at `REDIS_URL` (defaults to `redis://localhost:6379`).

use clipflow_models::{PipelineStatus, Stage, VideoId};
use clipflow_queue::{KvClient, LockService, RequestStream, StatusService};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_connection() {
    dotenvy::dotenv().ok();

    let kv = KvClient::new(&redis_url()).expect("failed to create kv client");
    let stream = RequestStream::new(kv);
    stream.ensure_group().await.expect("failed to ensure consumer group");

    let len = stream.len().await.expect("failed to get stream length");
    println!("stream length: {len}");
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_submit_and_claim_cycle() {
    dotenvy::dotenv().ok();

    let kv = KvClient::new(&redis_url()).expect("failed to create kv client");
    let stream = RequestStream::new(kv);
    stream.ensure_group().await.expect("failed to ensure consumer group");

    let message_id = stream
        .submit("pipeline:test-video:1", "test-video", "{}", 0.0)
        .await
        .expect("failed to submit");
    println!("submitted message {message_id}");

    let consumer_name = "test-consumer";
    let messages = stream.read_new(consumer_name, 1000, 1).await.expect("failed to read");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].video_id, "test-video");

    stream.ack(&messages[0].id).await.expect("failed to ack");
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_lock_exclusivity() {
    dotenvy::dotenv().ok();

    let kv = KvClient::new(&redis_url()).expect("failed to create kv client");
    let lock = LockService::new(kv);

    let video_id = "test-lock-video";
    let acquired_first = lock.acquire_lock(video_id, "req-1", "worker-1").await.expect("acquire failed");
    assert!(acquired_first);

    let acquired_second = lock.acquire_lock(video_id, "req-2", "worker-2").await.expect("acquire failed");
    assert!(!acquired_second, "lock must be exclusive per video_id");

    lock.release_lock(video_id).await.expect("release failed");

    let acquired_after_release = lock.acquire_lock(video_id, "req-3", "worker-1").await.expect("acquire failed");
    assert!(acquired_after_release);
    lock.release_lock(video_id).await.ok();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_status_stage_transitions() {
    dotenvy::dotenv().ok();

    let kv = KvClient::new(&redis_url()).expect("failed to create kv client");
    let status = StatusService::new(kv);
    let video_id = VideoId::from_string("test-status-video");

    status
        .initialize_status(
            video_id.as_str(),
            "req-status-1",
            "qwen3_vl_fp8",
            "qwen3_vl_fp8",
            "{}",
            clipflow_models::FULL_STAGES,
        )
        .await
        .expect("failed to initialize");
    status
        .update_pipeline_status(video_id.as_str(), PipelineStatus::Processing)
        .await
        .expect("failed to update status");
    status
        .mark_stage_started(video_id.as_str(), Stage::Download)
        .await
        .expect("failed to mark started");
    status
        .mark_stage_completed(video_id.as_str(), Stage::Download)
        .await
        .expect("failed to mark completed");

    let live = status.get_status(video_id.as_str()).await.expect("failed to read status");
    assert!(live.is_some());
}
