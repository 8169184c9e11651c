//! Durable stream primitives for `pipeline:requests` (C12 plumbing).
//!
//! `PipelineRequest` entries are submitted here with consumer-group
//! semantics; the stream worker in `clipflow-worker` drives the consume
//! loop using these primitives.

use std::collections::HashMap;

use redis::AsyncCommands;
use tracing::{debug, info};

use crate::error::{QueueError, QueueResult};
use crate::kv::KvClient;

pub const REQUESTS_STREAM: &str = "pipeline:requests";
pub const CONSUMER_GROUP: &str = "pipeline_workers";

/// One entry read off the stream: the raw fields plus the message id
/// needed to ack/claim it.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub id: String,
    pub request_id: String,
    pub video_id: String,
    pub config: String,
    pub requested_at: f64,
}

pub struct RequestStream {
    kv: KvClient,
    stream: String,
    group: String,
}

impl RequestStream {
    pub fn new(kv: KvClient) -> Self {
        Self {
            kv,
            stream: REQUESTS_STREAM.to_string(),
            group: CONSUMER_GROUP.to_string(),
        }
    }

    pub fn with_names(kv: KvClient, stream: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            kv,
            stream: stream.into(),
            group: group.into(),
        }
    }

    /// Idempotently ensure the consumer group exists; swallows "BUSYGROUP".
    pub async fn ensure_group(&self) -> QueueResult<()> {
        let mut conn = self.kv.raw_conn().await?;
        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream)
            .arg(&self.group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => {
                info!(group = %self.group, "created consumer group");
                Ok(())
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(group = %self.group, "consumer group already exists");
                Ok(())
            }
            Err(e) => Err(QueueError::from(e)),
        }
    }

    /// Append a `PipelineRequest` entry. Returns the stream message id.
    pub async fn submit(&self, request_id: &str, video_id: &str, config: &str, requested_at: f64) -> QueueResult<String> {
        let mut conn = self.kv.raw_conn().await?;
        let message_id: String = redis::cmd("XADD")
            .arg(&self.stream)
            .arg("*")
            .arg("request_id")
            .arg(request_id)
            .arg("video_id")
            .arg(video_id)
            .arg("config")
            .arg(config)
            .arg("requested_at")
            .arg(requested_at.to_string())
            .query_async(&mut conn)
            .await?;
        Ok(message_id)
    }

    /// Blocking `XREADGROUP ... >` read of new messages.
    pub async fn read_new(&self, consumer_name: &str, block_ms: u64, count: usize) -> QueueResult<Vec<StreamMessage>> {
        let mut conn = self.kv.raw_conn().await?;
        let reply: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.stream)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        Ok(parse_reply(reply))
    }

    /// `xautoclaim` stale messages idle for at least `min_idle_ms`.
    pub async fn autoclaim_stale(&self, consumer_name: &str, min_idle_ms: u64, count: usize) -> QueueResult<Vec<StreamMessage>> {
        let mut conn = self.kv.raw_conn().await?;
        let reply: redis::streams::StreamAutoClaimReply = redis::cmd("XAUTOCLAIM")
            .arg(&self.stream)
            .arg(&self.group)
            .arg(consumer_name)
            .arg(min_idle_ms)
            .arg("0-0")
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let mut messages = Vec::with_capacity(reply.claimed.len());
        for entry in reply.claimed {
            if let Some(msg) = message_from_fields(&entry.id, &entry.map) {
                messages.push(msg);
            }
        }
        Ok(messages)
    }

    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.kv.raw_conn().await?;
        redis::cmd("XACK")
            .arg(&self.stream)
            .arg(&self.group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.kv.raw_conn().await?;
        Ok(conn.xlen(&self.stream).await?)
    }

    /// Count of pending (unacked) entries for this group.
    pub async fn pending_count(&self) -> QueueResult<u64> {
        let mut conn = self.kv.raw_conn().await?;
        let reply: redis::streams::StreamPendingReply = redis::cmd("XPENDING")
            .arg(&self.stream)
            .arg(&self.group)
            .query_async(&mut conn)
            .await?;
        Ok(reply.count() as u64)
    }
}

fn parse_reply(reply: redis::streams::StreamReadReply) -> Vec<StreamMessage> {
    let mut messages = Vec::new();
    for key in reply.keys {
        for entry in key.ids {
            if let Some(msg) = message_from_fields(&entry.id, &entry.map) {
                messages.push(msg);
            }
        }
    }
    messages
}

fn message_from_fields(id: &str, map: &HashMap<String, redis::Value>) -> Option<StreamMessage> {
    let get = |field: &str| -> Option<String> {
        match map.get(field) {
            Some(redis::Value::BulkString(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Some(redis::Value::SimpleString(s)) => Some(s.clone()),
            _ => None,
        }
    };
    Some(StreamMessage {
        id: id.to_string(),
        request_id: get("request_id")?,
        video_id: get("video_id")?,
        config: get("config")?,
        requested_at: get("requested_at")?.parse().ok()?,
    })
}
