//! Session repository contract and PostgreSQL implementation.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use agora_core::error::{AppError, ErrorKind};
use agora_core::result::AppResult;
use agora_entity::session::Session;

/// Keyed storage for [`Session`] records.
///
/// Every query that depends on "active" takes the caller's `now` so that the
/// memory and PostgreSQL backends agree on the boundary and tests can drive
/// time explicitly. A session is active when `!is_revoked && expires_at > now`.
#[async_trait]
pub trait SessionRepository: Send + Sync + Debug + 'static {
    /// Persist a new session.
    async fn insert(&self, session: &Session) -> AppResult<()>;

    /// Find a session by ID regardless of state.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// Find a session by token hash regardless of state.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>>;

    /// Active sessions for a user, most recently active first.
    async fn find_active_by_user(&self, user_id: Uuid, now: DateTime<Utc>)
    -> AppResult<Vec<Session>>;

    /// Number of active sessions for a user.
    async fn count_active_by_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// The active session with the oldest `last_active`, ties broken by
    /// `created_at`. `exclude` skips one session.
    async fn find_least_recently_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<Session>>;

    /// Move `last_active` forward to `at`. No-op for revoked sessions.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Revoke one session. Returns `false` if it was missing or already revoked.
    async fn revoke(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke every active session of a user except `except`.
    async fn revoke_all_by_user(
        &self,
        user_id: Uuid,
        except: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Mark expired, unrevoked sessions as revoked. `None` sweeps every user.
    async fn revoke_expired(&self, user_id: Option<Uuid>, now: DateTime<Utc>) -> AppResult<u64>;

    /// Delete sessions whose [`Session::ended_at`] is at or before `cutoff`.
    async fn purge_ended(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// PostgreSQL-backed session repository.
#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert(&self, session: &Session) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, device, browser, ip_address, location, \
             created_at, last_active, expires_at, is_revoked, revoked_at, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(&session.device)
        .bind(&session.browser)
        .bind(&session.ip_address)
        .bind(&session.location)
        .bind(session.created_at)
        .bind(session.last_active)
        .bind(session.expires_at)
        .bind(session.is_revoked)
        .bind(session.revoked_at)
        .bind(Json(&session.metadata))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find session by token", e)
            })
    }

    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 AND NOT is_revoked AND expires_at > $2 \
             ORDER BY last_active DESC, created_at DESC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active sessions", e)
        })
    }

    async fn count_active_by_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND NOT is_revoked AND expires_at > $2",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count active sessions", e)
        })?;
        Ok(count.max(0) as u64)
    }

    async fn find_least_recently_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 AND NOT is_revoked AND expires_at > $2 \
             AND ($3::uuid IS NULL OR id <> $3) \
             ORDER BY last_active ASC, created_at ASC LIMIT 1",
        )
        .bind(user_id)
        .bind(now)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to find least recently active session",
                e,
            )
        })
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET last_active = GREATEST(last_active, $2) \
             WHERE id = $1 AND NOT is_revoked",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch session", e))?;
        Ok(())
    }

    async fn revoke(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET is_revoked = TRUE, revoked_at = $2 WHERE id = $1 AND NOT is_revoked",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke session", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_by_user(
        &self,
        user_id: Uuid,
        except: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_revoked = TRUE, revoked_at = $3 \
             WHERE user_id = $1 AND NOT is_revoked AND expires_at > $3 \
             AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(except)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn revoke_expired(&self, user_id: Option<Uuid>, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_revoked = TRUE, revoked_at = $2 \
             WHERE NOT is_revoked AND expires_at <= $2 \
             AND ($1::uuid IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep expired sessions", e)
        })?;
        Ok(result.rows_affected())
    }
    async fn purge_ended(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM sessions \
             WHERE CASE WHEN is_revoked AND revoked_at IS NOT NULL \
                        THEN LEAST(revoked_at, expires_at) \
                        ELSE expires_at END <= $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge ended sessions", e)
        })?;
        Ok(result.rows_affected())
    }
}
