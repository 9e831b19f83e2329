//! Unified application error types for Agora.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RateLimitOutcome;

/// Why a request was treated as unauthenticated.
///
/// Clients react differently per reason: `Expired` warrants a silent
/// re-login prompt while `SignatureInvalid` is worth a security alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    /// No bearer credential was supplied.
    Missing,
    /// The credential could not be parsed.
    Malformed,
    /// The credential was not signed by this service.
    SignatureInvalid,
    /// The credential or its session has expired.
    Expired,
    /// The session was revoked, evicted, or never existed.
    Revoked,
    /// The session could not be looked up in time.
    Unavailable,
    /// Login with an unknown email or a wrong password.
    InvalidCredentials,
}

impl AuthFailure {
    /// Stable wire name used in 401 bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::SignatureInvalid => "signature_invalid",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Unavailable => "unavailable",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// The request is not authenticated, tagged with the specific reason.
    Unauthorized(AuthFailure),
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// A rate limit window was exceeded.
    RateLimited,
    /// An internal server error occurred.
    Internal,
    /// The session/user store failed.
    Database,
    /// The counter store failed.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Unauthorized(_) => write!(f, "UNAUTHORIZED"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified application error used throughout Agora.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Window state attached to `RateLimited` errors.
    pub rate_limit: Option<RateLimitOutcome>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            rate_limit: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
            rate_limit: None,
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an unauthorized error tagged with its reason.
    pub fn unauthorized(reason: AuthFailure, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized(reason), message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a rate-limited error carrying the window that rejected the call.
    pub fn rate_limited(outcome: RateLimitOutcome) -> Self {
        let mut err = Self::new(
            ErrorKind::RateLimited,
            format!(
                "Too many requests. Try again in {} seconds.",
                outcome.retry_after
            ),
        );
        err.rate_limit = Some(outcome);
        err
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Returns the authentication failure reason, if this is a 401-class error.
    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self.kind {
            ErrorKind::Unauthorized(reason) => Some(reason),
            _ => None,
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
            rate_limit: self.rate_limit,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn test_unauthorized_carries_reason() {
        let err = AppError::unauthorized(AuthFailure::Expired, "Token has expired");
        assert_eq!(err.auth_failure(), Some(AuthFailure::Expired));
        assert_eq!(err.to_string(), "UNAUTHORIZED: Token has expired");
    }

    #[test]
    fn test_rate_limited_keeps_outcome_on_clone() {
        let now = Utc::now();
        let outcome = RateLimitOutcome::at(now, false, 3, 0, now + Duration::seconds(30));
        let err = AppError::rate_limited(outcome).clone();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.message, "Too many requests. Try again in 30 seconds.");
        assert_eq!(err.rate_limit.map(|o| o.limit), Some(3));
        assert!(err.auth_failure().is_none());
    }
}
