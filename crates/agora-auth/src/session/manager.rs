//! Session lifecycle manager.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use agora_core::config::SessionConfig;
use agora_core::error::{AppError, AuthFailure};
use agora_core::result::AppResult;
use agora_core::traits::Clock;
use agora_database::repositories::{SessionRepository, UserRepository};
use agora_entity::session::{ClientInfo, Session, SessionState};
use agora_entity::user::User;

use crate::jwt::{hash_session_token, mint_session_token};

/// A newly created session and its raw token.
///
/// The raw token exists only here; storage keeps its hash.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    /// The stored session.
    pub session: Session,
    /// Opaque session token to embed in the bearer token.
    pub token: String,
}

/// Outcome of looking up a session token.
#[derive(Debug, Clone)]
pub enum SessionCheck {
    /// Active; `last_active` has been bumped.
    Valid(Session),
    /// No session carries this token.
    NotFound,
    /// Revoked, evicted, or swept.
    Revoked,
    /// Past `expires_at`.
    Expired,
    /// The lookup failed or timed out.
    Unavailable,
}

impl SessionCheck {
    /// The 401 reason for a non-valid outcome.
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            Self::Valid(_) => None,
            Self::NotFound | Self::Revoked => Some(AuthFailure::Revoked),
            Self::Expired => Some(AuthFailure::Expired),
            Self::Unavailable => Some(AuthFailure::Unavailable),
        }
    }
}

/// Owns session creation, validation, revocation, and cleanup.
///
/// No lock is held across store I/O. The count, evict, insert sequence
/// works on a snapshot; concurrent logins for one user can briefly exceed
/// the cap and the post-insert trim pulls the count back down.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            users,
            config,
            clock,
        }
    }

    /// Session configuration in effect.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates a session for `user`, evicting least-recently-active sessions
    /// to stay within `max_active_sessions`.
    pub async fn create_session(&self, user: &User, client: &ClientInfo) -> AppResult<CreatedSession> {
        let max = u64::from(self.config.max_active_sessions.max(1));

        self.cleanup_expired_sessions(Some(user.id)).await?;

        let now = self.clock.now();
        let mut active = self.sessions.count_active_by_user(user.id, now).await?;
        while active >= max {
            match self
                .sessions
                .find_least_recently_active(user.id, now, None)
                .await?
            {
                Some(victim) => {
                    self.evict(&victim).await?;
                    active -= 1;
                }
                None => break,
            }
        }

        let token = mint_session_token();
        let ttl = hours(self.config.expiry_hours, "session.expiry_hours")?;
        let session = Session::new(user.id, hash_session_token(&token), client, now, ttl);
        self.sessions.insert(&session).await?;

        if let Err(e) = self
            .users
            .record_activity(user.id, now, &client.device_summary())
            .await
        {
            warn!(user_id = %user.id, error = %e, "Failed to record user activity");
        }

        self.trim_after_insert(user.id, session.id, max).await?;

        info!(
            user_id = %user.id,
            session_id = %session.id,
            device = ?session.device,
            ip = ?session.ip_address,
            "Session created"
        );
        Ok(CreatedSession { session, token })
    }

    /// Revokes sessions other than `keep` while the user is over `max`.
    async fn trim_after_insert(&self, user_id: Uuid, keep: Uuid, max: u64) -> AppResult<()> {
        let now = self.clock.now();
        let mut active = self.sessions.count_active_by_user(user_id, now).await?;
        while active > max {
            let Some(victim) = self
                .sessions
                .find_least_recently_active(user_id, now, Some(keep))
                .await?
            else {
                break;
            };
            self.evict(&victim).await?;
            active -= 1;
        }
        Ok(())
    }

    async fn evict(&self, victim: &Session) -> AppResult<()> {
        let revoked = self.sessions.revoke(victim.id, self.clock.now()).await?;
        if revoked {
            info!(
                user_id = %victim.user_id,
                session_id = %victim.id,
                last_active = %victim.last_active,
                "Evicted least recently active session"
            );
        }
        Ok(())
    }

    /// Looks up a session token and reports why it is unusable, if it is.
    ///
    /// A lookup that errors or exceeds `lookup_timeout_ms` is `Unavailable`.
    /// The follow-up activity update gets the same bound and never fails
    /// the check.
    /// An IP differing from the one at login is logged, not rejected.
    pub async fn check_session(&self, token: &str, client: &ClientInfo) -> SessionCheck {
        let token_hash = hash_session_token(token);
        let timeout = Duration::from_millis(self.config.lookup_timeout_ms);

        let found = match tokio::time::timeout(
            timeout,
            self.sessions.find_by_token_hash(&token_hash),
        )
        .await
        {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                error!(error = %e, "Session lookup failed");
                return SessionCheck::Unavailable;
            }
            Err(_) => {
                warn!(timeout_ms = self.config.lookup_timeout_ms, "Session lookup timed out");
                return SessionCheck::Unavailable;
            }
        };

        let Some(mut session) = found else {
            debug!("Unknown session token");
            return SessionCheck::NotFound;
        };

        let now = self.clock.now();
        match session.state_at(now) {
            SessionState::Revoked => return SessionCheck::Revoked,
            SessionState::Expired => return SessionCheck::Expired,
            SessionState::Active => {}
        }

        if let (Some(recorded), Some(current)) = (&session.ip_address, &client.ip_address) {
            if recorded != current {
                warn!(
                    user_id = %session.user_id,
                    session_id = %session.id,
                    login_ip = %recorded,
                    request_ip = %current,
                    "Session used from a different IP"
                );
            }
        }

        // Activity tracking is best effort and shares the lookup deadline.
        match tokio::time::timeout(timeout, self.sessions.touch(session.id, now)).await {
            Ok(Ok(())) => session.last_active = session.last_active.max(now),
            Ok(Err(e)) => {
                warn!(session_id = %session.id, error = %e, "Failed to update last activity");
            }
            Err(_) => {
                warn!(
                    session_id = %session.id,
                    timeout_ms = self.config.lookup_timeout_ms,
                    "Last activity update timed out"
                );
            }
        }

        SessionCheck::Valid(session)
    }

    /// Returns the active session for `token`, or `None` when it is missing,
    /// revoked, expired, or could not be looked up.
    pub async fn validate_session(&self, token: &str, client: &ClientInfo) -> Option<Session> {
        match self.check_session(token, client).await {
            SessionCheck::Valid(session) => Some(session),
            _ => None,
        }
    }

    /// Revokes one session. Returns `false` if it was already revoked or unknown.
    pub async fn revoke_session(&self, session_id: Uuid) -> AppResult<bool> {
        let revoked = self.sessions.revoke(session_id, self.clock.now()).await?;
        if revoked {
            info!(session_id = %session_id, "Session revoked");
        }
        Ok(revoked)
    }

    /// Revokes every active session of `user_id` except `except`.
    pub async fn revoke_all_sessions(&self, user_id: Uuid, except: Option<Uuid>) -> AppResult<u64> {
        let count = self
            .sessions
            .revoke_all_by_user(user_id, except, self.clock.now())
            .await?;
        info!(user_id = %user_id, kept = ?except, count, "Revoked user sessions");
        Ok(count)
    }

    /// Marks expired, unrevoked sessions as revoked, for one user or all.
    pub async fn cleanup_expired_sessions(&self, user_id: Option<Uuid>) -> AppResult<u64> {
        let count = self
            .sessions
            .revoke_expired(user_id, self.clock.now())
            .await?;
        if count > 0 {
            debug!(user_id = ?user_id, count, "Swept expired sessions");
        }
        Ok(count)
    }

    /// Deletes sessions that ended more than `retention_hours` ago.
    ///
    /// A purged token looks up as `NotFound`, which is rejected the same
    /// way as `Revoked`.
    pub async fn purge_ended_sessions(&self) -> AppResult<u64> {
        let retention = hours(self.config.retention_hours, "session.retention_hours")?;
        let Some(cutoff) = self.clock.now().checked_sub_signed(retention) else {
            return Ok(0);
        };
        let count = self.sessions.purge_ended(cutoff).await?;
        if count > 0 {
            debug!(count, cutoff = %cutoff, "Purged ended sessions");
        }
        Ok(count)
    }

    /// Active sessions for `user_id`, most recently active first.
    pub async fn get_active_sessions(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        self.sessions
            .find_active_by_user(user_id, self.clock.now())
            .await
    }

    /// Finds a session by ID in any state.
    pub async fn find_session(&self, session_id: Uuid) -> AppResult<Option<Session>> {
        self.sessions.find_by_id(session_id).await
    }
}

fn hours(value: u64, field: &str) -> AppResult<ChronoDuration> {
    i64::try_from(value)
        .ok()
        .and_then(ChronoDuration::try_hours)
        .ok_or_else(|| AppError::configuration(format!("{field} is out of range")))
}
