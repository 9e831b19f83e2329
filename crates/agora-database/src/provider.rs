//! Repository backend selection.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use agora_core::config::DatabaseConfig;
use agora_core::error::{AppError, ErrorKind};
use agora_core::redact::redact_url;
use agora_core::result::AppResult;

use crate::memory::{MemorySessionRepository, MemoryUserRepository};
use crate::repositories::{
    PgSessionRepository, PgUserRepository, SessionRepository, UserRepository,
};

/// The repositories the rest of the service is wired with.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Session store.
    pub sessions: Arc<dyn SessionRepository>,
    /// User store.
    pub users: Arc<dyn UserRepository>,
    pool: Option<PgPool>,
}

impl Repositories {
    /// Build repositories for the configured provider (`memory` or `postgres`).
    ///
    /// The PostgreSQL provider connects and runs pending migrations first.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "memory" => {
                info!("Using in-memory session store");
                Ok(Self::in_memory())
            }
            "postgres" => {
                let pool = connect_postgres(config).await?;
                sqlx::migrate!("../../migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Session store migration failed", e)
                    })?;
                Ok(Self::postgres(pool))
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: memory, postgres"
            ))),
        }
    }

    /// In-process repositories.
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(MemorySessionRepository::new()),
            users: Arc::new(MemoryUserRepository::new()),
            pool: None,
        }
    }

    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Check store connectivity. Always healthy for the memory provider.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(pool) => sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(pool)
                .await
                .map(|v| v == 1)
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Session store unreachable", e)
                }),
            None => Ok(true),
        }
    }

    /// Release pooled connections.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Session store pool closed");
        }
    }
}

async fn connect_postgres(config: &DatabaseConfig) -> AppResult<PgPool> {
    info!(
        url = %redact_url(&config.url),
        max_connections = config.max_connections,
        "Opening session store pool"
    );
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&config.url)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Session store unreachable", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_provider_is_a_configuration_error() {
        let config = DatabaseConfig {
            provider: "sqlite".into(),
            ..DatabaseConfig::default()
        };
        let err = Repositories::from_config(&config).await.unwrap_err();
        assert_eq!(err.kind, agora_core::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_memory_provider_is_healthy() {
        let repos = Repositories::from_config(&DatabaseConfig::default())
            .await
            .unwrap();
        assert!(repos.health_check().await.unwrap());
    }
}
