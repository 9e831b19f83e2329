//! Session lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Session lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Concurrent active sessions allowed per user before LRU eviction.
    #[serde(default = "default_max_active_sessions")]
    pub max_active_sessions: u32,
    /// Session lifetime in hours.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    /// Upper bound on a session lookup during validation, in milliseconds.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_ms: u64,
    /// Interval between global cleanup sweeps, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
    /// How long a revoked or expired session is kept before a sweep deletes it.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_active_sessions: default_max_active_sessions(),
            expiry_hours: default_expiry_hours(),
            lookup_timeout_ms: default_lookup_timeout(),
            cleanup_interval_seconds: default_cleanup_interval(),
            retention_hours: default_retention_hours(),
        }
    }
}

fn default_max_active_sessions() -> u32 {
    5
}

fn default_expiry_hours() -> u64 {
    24
}

fn default_lookup_timeout() -> u64 {
    2_000
}

fn default_cleanup_interval() -> u64 {
    300
}

fn default_retention_hours() -> u64 {
    168
}
