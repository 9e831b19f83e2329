//! Counter store contract.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use agora_core::result::AppResult;
use agora_entity::rate_limit::RateLimitCounter;

/// Storage for fixed-window counters.
///
/// `hit` must be atomic per key: concurrent hits on one key never lose an
/// increment.
#[async_trait]
pub trait CounterStore: Send + Sync + Debug + 'static {
    /// Record one call on `key` and return the window after the increment.
    ///
    /// Opens a new window at `now` when none exists or the current one has
    /// elapsed; the first call of a window leaves `count == 1`.
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window_ms: i64,
        limit: u32,
    ) -> AppResult<RateLimitCounter>;

    /// Forget the window for `key`.
    async fn reset(&self, key: &str) -> AppResult<()>;

    /// Drop windows that have elapsed as of `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Check backend connectivity.
    async fn health_check(&self) -> AppResult<bool>;
}
