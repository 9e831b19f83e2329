//! User repository contract and PostgreSQL implementation.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use agora_core::error::{AppError, ErrorKind};
use agora_core::result::AppResult;
use agora_entity::user::User;

/// Storage for [`User`] accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug + 'static {
    /// Find a user by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a user. Fails with `Conflict` when the email is taken.
    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Record the last time and device the user was seen on.
    async fn record_activity(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        device_info: &serde_json::Value,
    ) -> AppResult<()>;

    /// Replace the stored password hash.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
}

/// PostgreSQL-backed user repository.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, account_level, last_active_at, \
             last_device_info, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.account_level)
        .bind(user.last_active_at)
        .bind(&user.last_device_info)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("Email '{}' is already registered", user.email))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })?;
        Ok(())
    }

    async fn record_activity(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        device_info: &serde_json::Value,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_active_at = $2, last_device_info = $3 WHERE id = $1")
            .bind(id)
            .bind(at)
            .bind(device_info)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to record user activity", e)
            })?;
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update password", e)
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }
}
