//! Claims carried by every bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_entity::user::{AccountLevel, UserRole};

/// Token payload.
///
/// The token carries no revocation state. `sst` names the session it was
/// issued for and the session record decides whether it is still usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: Uuid,
    /// User role at the time of issuance.
    pub role: UserRole,
    /// Account level at the time of issuance.
    pub account_level: AccountLevel,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
    /// Opaque session token this bearer token is bound to.
    pub sst: String,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Seconds left before expiry as of `now`; negative once expired.
    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> i64 {
        self.exp - now.timestamp()
    }
}
