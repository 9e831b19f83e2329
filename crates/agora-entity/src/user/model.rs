//! User entity model (the slice of the user record this service touches).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::{AccountLevel, UserRole};

/// A registered marketplace user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Login email, stored lowercase.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Marketplace role.
    pub role: UserRole,
    /// Verification tier.
    pub account_level: AccountLevel,
    /// Set when a session is created.
    pub last_active_at: Option<DateTime<Utc>>,
    /// Device snapshot from the most recent login.
    pub last_device_info: Option<serde_json::Value>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a user record with no activity yet.
    pub fn new(
        email: &str,
        password_hash: impl Into<String>,
        role: UserRole,
        account_level: AccountLevel,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash: password_hash.into(),
            role,
            account_level,
            last_active_at: None,
            last_device_info: None,
            created_at: now,
        }
    }
}
