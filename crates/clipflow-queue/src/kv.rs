//! Low-level async client over the shared key-value store (C1).
//!
//! Wraps a pooled Redis connection and exposes the primitive operations the
//! rest of this crate builds on: strings with set-if-absent and per-key
//! TTL, hashes, sets, sorted sets, and streams. Connection errors bubble up
//! as a single [`QueueError::StoreUnavailable`] kind; this layer does not
//! retry timeouts itself — that is the worker loop's job (see
//! `clipflow-worker::stream_worker`).

use std::collections::HashMap;

use redis::AsyncCommands;

use crate::error::{QueueError, QueueResult};

/// Pooled async client over the key-value store.
#[derive(Clone)]
pub struct KvClient {
    client: redis::Client,
}

impl KvClient {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| QueueError::StoreUnavailable(e.to_string()))?;
        Ok(Self { client })
    }

    async fn conn(&self) -> QueueResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::StoreUnavailable(e.to_string()))
    }

    // -- strings --------------------------------------------------------

    pub async fn get(&self, key: &str) -> QueueResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.get(key).await?)
    }

    pub async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        match ttl_secs {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    /// `SET key value NX EX ttl`. Returns true iff the key did not already
    /// exist and was set.
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> QueueResult<bool> {
        let mut conn = self.conn().await?;
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(result.is_some())
    }

    pub async fn del(&self, key: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> QueueResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.exists(key).await?)
    }

    pub async fn expire(&self, key: &str, ttl_secs: u64) -> QueueResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.expire(key, ttl_secs as i64).await?)
    }

    pub async fn ttl(&self, key: &str) -> QueueResult<i64> {
        let mut conn = self.conn().await?;
        Ok(conn.ttl(key).await?)
    }

    // -- hashes -----------------------------------------------------------

    pub async fn hset_multiple(&self, key: &str, fields: &HashMap<String, String>) -> QueueResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        let pairs: Vec<(&String, &String)> = fields.iter().collect();
        conn.hset_multiple::<_, _, _, ()>(key, &pairs).await?;
        Ok(())
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    pub async fn hget(&self, key: &str, field: &str) -> QueueResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.hget(key, field).await?)
    }

    pub async fn hgetall(&self, key: &str) -> QueueResult<HashMap<String, String>> {
        let mut conn = self.conn().await?;
        Ok(conn.hgetall(key).await?)
    }

    // -- sets -------------------------------------------------------------

    pub async fn sadd(&self, key: &str, member: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        conn.sadd::<_, _, ()>(key, member).await?;
        Ok(())
    }

    pub async fn srem(&self, key: &str, member: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        conn.srem::<_, _, ()>(key, member).await?;
        Ok(())
    }

    pub async fn smembers(&self, key: &str) -> QueueResult<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.smembers(key).await?)
    }

    // -- sorted sets --------------------------------------------------------

    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        conn.zadd::<_, _, _, ()>(key, member, score).await?;
        Ok(())
    }

    pub async fn zrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.zrange(key, start, stop).await?)
    }

    pub async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.zrevrange(key, start, stop).await?)
    }

    pub async fn zrem(&self, key: &str, member: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        conn.zrem::<_, _, ()>(key, member).await?;
        Ok(())
    }

    pub async fn zcard(&self, key: &str) -> QueueResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.zcard(key).await?)
    }

    /// Raw connection access for stream operations (XADD/XREADGROUP/...),
    /// which have no stable typed surface in the `redis` crate worth
    /// wrapping field-by-field here; see `crate::stream`.
    pub(crate) async fn raw_conn(&self) -> QueueResult<redis::aio::MultiplexedConnection> {
        self.conn().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_redis_url() {
        assert!(KvClient::new("not-a-redis-url").is_err());
    }
}
