//! The actions the gateway throttles.

use std::fmt;

/// A throttled action. Each has its own budget and mode in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    /// Credential check on `POST /auth/login`, scoped by client IP.
    Login,
    /// `PUT /users/me/password`, scoped by user.
    PasswordChange,
    /// Device listing on `GET /sessions`, scoped by user.
    SessionList,
    /// `POST /auth/refresh`, scoped by user.
    TokenRefresh,
}

impl RateLimitAction {
    /// Configuration key for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::PasswordChange => "password_change",
            Self::SessionList => "session_list",
            Self::TokenRefresh => "token_refresh",
        }
    }
}

impl fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
