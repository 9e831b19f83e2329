//! Counter store and coalescing cache configuration.

use serde::{Deserialize, Serialize};

/// Top-level cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backend for rate-limit counters: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific configuration.
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// Coalescing (single-flight) cache configuration.
    #[serde(default)]
    pub coalescing: CoalescingCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisCacheConfig::default(),
            coalescing: CoalescingCacheConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all Agora keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Bounds for single-flight caches of derived values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoalescingCacheConfig {
    /// Maximum retained entries; older writes are evicted first.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Lifetime of a cached value in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CoalescingCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "agora:".to_string()
}

fn default_max_entries() -> usize {
    1_000
}

fn default_ttl() -> u64 {
    5
}
