//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password.
    #[validate(length(
        min = 8,
        max = 128,
        message = "New password must be between 8 and 128 characters"
    ))]
    pub new_password: String,
}

/// Body of `PUT /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeAllRequest {
    /// Keep the session the request was made with.
    #[serde(default = "default_keep_current")]
    pub keep_current: bool,
}

impl Default for RevokeAllRequest {
    fn default() -> Self {
        Self {
            keep_current: default_keep_current(),
        }
    }
}

fn default_keep_current() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_new_password_fails_validation() {
        let req = ChangePasswordRequest {
            current_password: "old-password".into(),
            new_password: "short".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_keep_current_defaults_to_true() {
        let req: RevokeAllRequest = serde_json::from_str("{}").unwrap();
        assert!(req.keep_current);
        let req: RevokeAllRequest = serde_json::from_str(r#"{"keepCurrent":false}"#).unwrap();
        assert!(!req.keep_current);
    }
}
