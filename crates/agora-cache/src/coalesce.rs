//! Single-flight TTL cache.
//!
//! [`CoalescingCache::get`] runs the fetch function at most once per key
//! at a time: concurrent callers for the same key await one shared
//! in-flight future. Successful results are kept for a TTL; failures are
//! handed to every waiter and never stored.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::debug;

use agora_core::config::CoalescingCacheConfig;
use agora_core::error::AppError;
use agora_core::result::AppResult;

type InFlight<V> = Shared<BoxFuture<'static, Result<V, Arc<AppError>>>>;

#[derive(Debug)]
struct Cached<V> {
    value: V,
    expires_at: Instant,
    written: u64,
}

/// Bounded single-flight cache keyed by `K`.
///
/// Holds at most `max_entries` values; when full, the entry written longest
/// ago is evicted.
pub struct CoalescingCache<K, V> {
    entries: DashMap<K, Cached<V>>,
    pending: DashMap<K, InFlight<V>>,
    writes: AtomicU64,
    ttl: Duration,
    max_entries: usize,
}

impl<K: Eq + Hash, V> std::fmt::Debug for CoalescingCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingCache")
            .field("entries", &self.entries.len())
            .field("pending", &self.pending.len())
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl<K, V> CoalescingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache keeping `max_entries` values for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            pending: DashMap::new(),
            writes: AtomicU64::new(0),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &CoalescingCacheConfig) -> Self {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_seconds))
    }

    /// Return the cached value for `key`, or compute it with `fetch`.
    ///
    /// If another caller is already computing `key`, this awaits that
    /// computation instead of starting a new one.
    pub async fn get<F, Fut>(&self, key: K, fetch: F) -> AppResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>> + Send + 'static,
    {
        if let Some(value) = self.fresh(&key) {
            return Ok(value);
        }

        let in_flight = match self.pending.entry(key.clone()) {
            Entry::Occupied(slot) => slot.get().clone(),
            Entry::Vacant(slot) => {
                let fut = fetch().map(|r| r.map_err(Arc::new)).boxed().shared();
                slot.insert(fut.clone());
                fut
            }
        };

        let result = in_flight.clone().await;

        // Whichever waiter finishes first settles the entry. A pending marker
        // that was invalidated or replaced meanwhile is left alone and the
        // result is not stored.
        if let Entry::Occupied(slot) = self.pending.entry(key.clone()) {
            if slot.get().ptr_eq(&in_flight) {
                if let Ok(value) = &result {
                    self.store(key, value.clone());
                }
                let _ = slot.remove();
            }
        }

        result.map_err(|e| (*e).clone())
    }

    /// Drop one cached entry, or every entry when `key` is `None`.
    ///
    /// In-flight computations for the dropped keys still complete for their
    /// waiters but are not stored.
    pub fn invalidate(&self, key: Option<&K>) {
        match key {
            Some(key) => {
                self.pending.remove(key);
                self.entries.remove(key);
            }
            None => {
                self.pending.clear();
                self.entries.clear();
            }
        }
    }

    /// Number of stored values, including ones past their TTL not yet dropped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        if let Some(cached) = self.entries.get(key) {
            if cached.expires_at > now {
                return Some(cached.value.clone());
            }
        }
        self.entries.remove_if(key, |_, cached| cached.expires_at <= now);
        None
    }

    fn store(&self, key: K, value: V) {
        let written = self.writes.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            key,
            Cached {
                value,
                expires_at: Instant::now() + self.ttl,
                written,
            },
        );

        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().written)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    debug!(max_entries = self.max_entries, "Evicted oldest coalesced entry");
                }
                None => break,
            }
        }
    }
}
