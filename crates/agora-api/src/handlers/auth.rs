//! Auth handlers: login, logout, refresh.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::{info, warn};

use agora_auth::RateLimitAction;
use agora_core::error::{AppError, AuthFailure};

use super::run_blocking;
use crate::dto::request::LoginRequest;
use crate::dto::response::{LoginResponse, MessageResponse, RefreshResponse};
use crate::dto::validate_body;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ClientContext};
use crate::middleware::rate_limit::RateLimitHeaders;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    client: ClientContext,
    Json(req): Json<LoginRequest>,
) -> Result<(RateLimitHeaders, Json<LoginResponse>), ApiError> {
    let limit = state
        .rate_limiter
        .enforce(RateLimitAction::Login, client.scope())
        .await?;

    validate_body(&req)?;

    let invalid = || AppError::unauthorized(AuthFailure::InvalidCredentials, "Invalid email or password");

    let user = state
        .repositories
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    let hasher = Arc::clone(&state.password_hasher);
    let hash = user.password_hash.clone();
    let password = req.password;
    let verified = run_blocking(move || hasher.verify_password(&password, &hash)).await?;
    if !verified {
        info!(user_id = %user.id, ip = %client.scope(), "Login rejected");
        return Err(invalid().into());
    }

    let created = state.sessions.create_session(&user, &client).await?;
    state.invalidate_session_listing(user.id);

    let issued = match state.tokens.sign_token(&user, &created.token) {
        Ok(issued) => issued,
        Err(e) => {
            // The session is unusable without a token.
            if let Err(revoke_err) = state.sessions.revoke_session(created.session.id).await {
                warn!(session_id = %created.session.id, error = %revoke_err, "Failed to revoke orphaned session");
            }
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, session_id = %created.session.id, "User logged in");

    Ok((
        RateLimitHeaders(limit),
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            session_id: created.session.id,
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.sessions.revoke_session(auth.session.id).await?;
    state.invalidate_session_listing(auth.user_id());

    info!(user_id = %auth.user_id(), session_id = %auth.session.id, "User logged out");

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// POST /api/auth/refresh
///
/// Reissues a token for the current session once the presented one is
/// inside the refresh threshold; otherwise echoes it back.
pub async fn refresh(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(RateLimitHeaders, Json<RefreshResponse>), ApiError> {
    let user_id = auth.user_id();
    let limit = state
        .rate_limiter
        .enforce(RateLimitAction::TokenRefresh, &user_id.to_string())
        .await?;

    let threshold = state.config.auth.refresh_threshold_seconds;
    if !state.tokens.should_refresh_token(&auth.token, threshold) {
        return Ok((
            RateLimitHeaders(limit),
            Json(RefreshResponse {
                token: auth.token.clone(),
                expires_at: auth.claims.expires_at(),
                refreshed: false,
            }),
        ));
    }

    // Role and level are re-read so the new token reflects current state.
    let user = state
        .repositories
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized(AuthFailure::Revoked, "User no longer exists"))?;

    let issued = state.tokens.sign_token(&user, &auth.claims.sst)?;

    Ok((
        RateLimitHeaders(limit),
        Json(RefreshResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            refreshed: true,
        }),
    ))
}
