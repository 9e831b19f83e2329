//! User role and account level enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marketplace roles carried in token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Buys and takes part in the community.
    Member,
    /// Lists products for sale.
    Seller,
    /// Handles reports and moderation queues.
    Moderator,
    /// Full administrator.
    Admin,
}

impl UserRole {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Seller => "seller",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account verification tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountLevel {
    /// Freshly registered.
    Basic,
    /// Identity verified.
    Verified,
    /// Paid tier.
    Premium,
}

impl fmt::Display for AccountLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Verified => write!(f, "verified"),
            Self::Premium => write!(f, "premium"),
        }
    }
}
