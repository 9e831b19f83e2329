//! Redis-backed counter store.
//!
//! Each window is one integer key whose TTL is the window length. A Lua
//! script increments and arms the expiry in one round trip so concurrent
//! gateway nodes never lose an increment or leave an immortal key.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use agora_core::config::RedisCacheConfig;
use agora_core::error::{AppError, ErrorKind};
use agora_core::redact::redact_url;
use agora_core::result::AppResult;
use agora_entity::rate_limit::RateLimitCounter;

use crate::store::CounterStore;

/// INCR the key, arm PEXPIRE on the first hit (or if the TTL went missing),
/// and return `{count, pttl}`.
const HIT_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
local ttl = redis.call('PTTL', KEYS[1])
if count == 1 or ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
";

/// Counter store shared by every gateway node pointing at the same Redis.
#[derive(Debug, Clone)]
pub struct RedisCounterStore {
    /// Multiplexed, reconnecting connection; cloned per command.
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisCounterStore {
    /// Open the connection manager for the configured Redis URL.
    pub async fn connect(config: &RedisCacheConfig) -> AppResult<Self> {
        info!(url = %redact_url(&config.url), "Connecting counter store to Redis");
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| AppError::with_source(ErrorKind::Cache, "Invalid Redis URL", e))?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Counter store unreachable", e)
        })?;
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window_ms: i64,
        limit: u32,
    ) -> AppResult<RateLimitCounter> {
        let full_key = self.full_key(key);
        let mut conn = self.conn.clone();

        let (count, ttl_ms): (i64, i64) = redis::cmd("EVAL")
            .arg(HIT_SCRIPT)
            .arg(1)
            .arg(&full_key)
            .arg(window_ms)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        // Window start is reconstructed from the remaining TTL.
        let ttl_ms = ttl_ms.clamp(0, window_ms);
        let window_start = now + Duration::milliseconds(ttl_ms) - Duration::milliseconds(window_ms);

        debug!(key = %full_key, count, ttl_ms, "Rate-limit hit");
        Ok(RateLimitCounter {
            key: key.to_string(),
            count: count.max(0) as u64,
            window_start,
            window_duration_ms: window_ms,
            limit,
        })
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        let full_key = self.full_key(key);
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(&full_key)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> AppResult<u64> {
        // Windows expire natively through their TTL.
        Ok(0)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
