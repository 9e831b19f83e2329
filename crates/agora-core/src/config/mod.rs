//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `AGORA__*` environment variables. Each sub-module
//! represents a logical configuration section.

pub mod app;
pub mod auth;
pub mod cache;
pub mod database;
pub mod logging;
pub mod rate_limit;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::auth::AuthConfig;
pub use self::cache::{CacheConfig, CoalescingCacheConfig, RedisCacheConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::{ActionLimitConfig, LimitMode, RateLimitConfig};
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Session/user store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Counter store and coalescing cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Token signing settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Per-action rate limits.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// and environment variables prefixed with `AGORA__`
    /// (e.g. `AGORA__AUTH__JWT_SECRET`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AGORA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Longest configurable session lifetime or retention window: one year.
    pub const MAX_SESSION_HOURS: u64 = 24 * 366;

    /// Rejects configurations that would make the service insecure or inert.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(AppError::configuration(
                "auth.jwt_secret must be at least 32 bytes",
            ));
        }
        if self.session.max_active_sessions == 0 {
            return Err(AppError::configuration(
                "session.max_active_sessions must be at least 1",
            ));
        }
        if self.session.expiry_hours == 0 {
            return Err(AppError::configuration(
                "session.expiry_hours must be at least 1",
            ));
        }
        if self.session.expiry_hours > Self::MAX_SESSION_HOURS {
            return Err(AppError::configuration(format!(
                "session.expiry_hours must be at most {}",
                Self::MAX_SESSION_HOURS
            )));
        }
        if self.session.retention_hours > Self::MAX_SESSION_HOURS {
            return Err(AppError::configuration(format!(
                "session.retention_hours must be at most {}",
                Self::MAX_SESSION_HOURS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_limits() {
        let config = AppConfig::default();
        assert_eq!(config.session.max_active_sessions, 5);
        assert_eq!(config.session.expiry_hours, 24);
        assert_eq!(config.auth.token_ttl, "7d");
        assert_eq!(config.auth.refresh_threshold_seconds, 300);
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.jwt_secret = "x".repeat(32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_session_hours() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "x".repeat(32);

        config.session.expiry_hours = AppConfig::MAX_SESSION_HOURS;
        assert!(config.validate().is_ok());

        config.session.expiry_hours = u64::MAX;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Configuration);
        assert!(err.message.contains("expiry_hours"));

        config.session.expiry_hours = 24;
        config.session.retention_hours = AppConfig::MAX_SESSION_HOURS + 1;
        assert!(config.validate().is_err());
    }
}
