//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_entity::session::Session;

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
    /// Token expiration.
    pub expires_at: DateTime<Utc>,
    /// Session the token is bound to.
    pub session_id: Uuid,
}

/// Token refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// The new token, or the presented one when no reissue was due.
    pub token: String,
    /// Expiration of `token`.
    pub expires_at: DateTime<Utc>,
    /// Whether a new token was signed.
    pub refreshed: bool,
}

/// One row of the "manage devices" listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Session ID.
    pub id: Uuid,
    /// Device class.
    pub device: Option<String>,
    /// Browser family.
    pub browser: Option<String>,
    /// Client IP at login.
    pub ip_address: Option<String>,
    /// Coarse location.
    pub location: Option<String>,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Last validated request.
    pub last_active: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Whether this is the session making the request.
    pub is_current: bool,
}

impl SessionResponse {
    /// Builds a listing row, flagging the caller's own session.
    pub fn from_session(session: &Session, current: Uuid) -> Self {
        Self {
            id: session.id,
            device: session.device.clone(),
            browser: session.browser.clone(),
            ip_address: session.ip_address.clone(),
            location: session.location.clone(),
            created_at: session.created_at,
            last_active: session.last_active,
            expires_at: session.expires_at,
            is_current: session.id == current,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a bulk revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of sessions affected.
    pub revoked: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Session store reachable.
    pub database: bool,
    /// Counter store reachable.
    pub cache: bool,
}
