//! Token verification errors.

use thiserror::Error;

use agora_core::error::{AppError, AuthFailure};

/// Why a bearer token was rejected or could not be issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature is valid but `exp` is in the past.
    #[error("token has expired")]
    Expired,
    /// Signed with another key or an algorithm outside the allow-list.
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// Not a well-formed token.
    #[error("token is malformed: {0}")]
    Malformed(String),
    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => {
                AppError::unauthorized(AuthFailure::Expired, "Token has expired")
            }
            TokenError::SignatureInvalid => {
                AppError::unauthorized(AuthFailure::SignatureInvalid, "Invalid token signature")
            }
            TokenError::Malformed(_) => {
                AppError::unauthorized(AuthFailure::Malformed, "Invalid token format")
            }
            TokenError::Signing(msg) => AppError::internal(format!("Failed to sign token: {msg}")),
        }
    }
}
