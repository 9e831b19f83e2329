//! Counter store manager that dispatches to the configured backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use agora_core::config::CacheConfig;
use agora_core::error::AppError;
use agora_core::result::AppResult;
use agora_entity::rate_limit::RateLimitCounter;

use crate::store::CounterStore;

/// Wraps the configured [`CounterStore`].
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CounterManager {
    inner: Arc<dyn CounterStore>,
}

impl CounterManager {
    /// Create a counter manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CounterStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis counter store");
                Arc::new(crate::redis::RedisCounterStore::connect(&config.redis).await?)
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory counter store");
                Arc::new(crate::memory::MemoryCounterStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a counter manager from an existing store (for testing).
    pub fn from_store(store: Arc<dyn CounterStore>) -> Self {
        Self { inner: store }
    }
}

#[async_trait]
impl CounterStore for CounterManager {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window_ms: i64,
        limit: u32,
    ) -> AppResult<RateLimitCounter> {
        self.inner.hit(key, now, window_ms, limit).await
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        self.inner.reset(key).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.inner.purge_expired(now).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
