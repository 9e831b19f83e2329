//! In-memory counter store backed by `dashmap`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use agora_core::result::AppResult;
use agora_entity::rate_limit::RateLimitCounter;

use crate::store::CounterStore;

/// Counters held in a sharded map. Each hit mutates its entry under the
/// shard lock, so updates on one key are serialised and other keys proceed
/// in parallel.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, RateLimitCounter>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked windows.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no windows are tracked.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window_ms: i64,
        limit: u32,
    ) -> AppResult<RateLimitCounter> {
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| RateLimitCounter::open(key, now, window_ms, limit));
        entry.window_duration_ms = window_ms;
        entry.limit = limit;
        entry.hit(now);
        Ok(entry.clone())
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        self.counters.remove(key);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let before = self.counters.len();
        self.counters.retain(|_, counter| !counter.is_elapsed(now));
        let removed = before.saturating_sub(self.counters.len()) as u64;
        if removed > 0 {
            debug!(removed, "Purged elapsed rate-limit windows");
        }
        Ok(removed)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
