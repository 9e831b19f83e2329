//! `AuthUser` extractor: pulls the bearer token, verifies it, and checks its session.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use agora_auth::{Claims, SessionCheck};
use agora_core::error::{AppError, AuthFailure};
use agora_entity::session::{ClientInfo, Session};

use super::client::client_info;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Verified token claims.
    pub claims: Claims,
    /// The live session the token is bound to.
    pub session: Session,
    /// Client the request came from.
    pub client: ClientInfo,
    /// The raw bearer token as presented.
    pub token: String,
}

impl AuthUser {
    /// The caller's user ID.
    pub fn user_id(&self) -> uuid::Uuid {
        self.claims.user_id()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.to_string();

        let claims = state.tokens.verify_token(&token)?;

        let client = client_info(parts, state.config.server.trust_forwarded_for);
        let check = state.sessions.check_session(&claims.sst, &client).await;
        let session = match check {
            SessionCheck::Valid(session) => session,
            other => {
                let reason = other.failure().unwrap_or(AuthFailure::Revoked);
                return Err(AppError::unauthorized(reason, session_message(reason)).into());
            }
        };

        // A session token lifted into a token for someone else.
        if session.user_id != claims.user_id() {
            tracing::warn!(
                session_id = %session.id,
                subject = %claims.user_id(),
                "Token subject does not own its session"
            );
            return Err(AppError::unauthorized(AuthFailure::Revoked, "Session is no longer valid").into());
        }

        Ok(Self {
            claims,
            session,
            client,
            token,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized(AuthFailure::Missing, "Missing Authorization header"))?;

    header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::unauthorized(AuthFailure::Malformed, "Invalid Authorization header format")
        })
}

fn session_message(reason: AuthFailure) -> &'static str {
    match reason {
        AuthFailure::Expired => "Session has expired",
        AuthFailure::Unavailable => "Session could not be verified",
        _ => "Session is no longer valid",
    }
}
