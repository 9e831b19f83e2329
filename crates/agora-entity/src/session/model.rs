//! Session entity model.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::client::ClientInfo;

/// Lifecycle state of a session at a given instant.
///
/// `Active` is the only non-terminal state; nothing leads back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Not revoked and not yet expired.
    Active,
    /// Explicitly revoked, evicted, or swept after expiry.
    Revoked,
    /// Past `expires_at` but not yet swept.
    Expired,
}

/// A login session binding a bearer token to a user and device.
///
/// Sessions are created on login, touched on every validated request, and
/// end by revocation, cap eviction, or expiry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 hex digest of the opaque session token. Unique.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Device class ("desktop", "mobile", "tablet").
    pub device: Option<String>,
    /// Browser family.
    pub browser: Option<String>,
    /// Client IP at login.
    pub ip_address: Option<String>,
    /// Coarse location, when the gateway resolves one.
    pub location: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last validated request.
    pub last_active: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Whether the session has been revoked.
    pub is_revoked: bool,
    /// When it was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Open extension fields such as `os` and `user_agent`.
    #[sqlx(json)]
    pub metadata: BTreeMap<String, String>,
}

impl Session {
    /// Builds a new active session for `user_id` expiring `ttl` after `now`.
    pub fn new(
        user_id: Uuid,
        token_hash: impl Into<String>,
        client: &ClientInfo,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash: token_hash.into(),
            device: client.device.clone(),
            browser: client.browser.clone(),
            ip_address: client.ip_address.clone(),
            location: client.location.clone(),
            created_at: now,
            last_active: now,
            expires_at: now + ttl,
            is_revoked: false,
            revoked_at: None,
            metadata: client.metadata(),
        }
    }

    /// Lifecycle state as of `now`. Revocation wins over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.is_revoked {
            SessionState::Revoked
        } else if self.expires_at <= now {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    /// `!is_revoked && expires_at > now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == SessionState::Active
    }

    /// Expired and not yet marked revoked; what a cleanup pass sweeps.
    pub fn is_sweepable_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == SessionState::Expired
    }

    /// When the session stopped being usable: the earlier of revocation and
    /// expiry.
    pub fn ended_at(&self) -> DateTime<Utc> {
        match self.revoked_at {
            Some(revoked_at) if self.is_revoked => revoked_at.min(self.expires_at),
            _ => self.expires_at,
        }
    }

    /// Marks the session revoked at `now`. Returns `false` if it already was.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_revoked {
            return false;
        }
        self.is_revoked = true;
        self.revoked_at = Some(now);
        true
    }
}
