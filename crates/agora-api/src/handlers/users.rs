//! Account handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::info;

use agora_auth::RateLimitAction;
use agora_core::error::{AppError, AuthFailure};

use super::run_blocking;
use crate::dto::request::ChangePasswordRequest;
use crate::dto::response::CountResponse;
use crate::dto::validate_body;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rate_limit::RateLimitHeaders;
use crate::state::AppState;

/// PUT /api/users/me/password
///
/// Rehashes the password and revokes every other session of the caller.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(RateLimitHeaders, Json<CountResponse>), ApiError> {
    let user_id = auth.user_id();
    let limit = state
        .rate_limiter
        .enforce(RateLimitAction::PasswordChange, &user_id.to_string())
        .await?;

    validate_body(&req)?;

    let user = state
        .repositories
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized(AuthFailure::Revoked, "User no longer exists"))?;

    let hasher = Arc::clone(&state.password_hasher);
    let current_hash = user.password_hash.clone();
    let ChangePasswordRequest {
        current_password,
        new_password,
    } = req;
    let new_hash = run_blocking(move || {
        if !hasher.verify_password(&current_password, &current_hash)? {
            return Err(AppError::validation("Current password is incorrect"));
        }
        hasher.hash_password(&new_password)
    })
    .await?;

    state
        .repositories
        .users
        .update_password_hash(user_id, &new_hash)
        .await?;

    let revoked = state
        .sessions
        .revoke_all_sessions(user_id, Some(auth.session.id))
        .await?;
    state.invalidate_session_listing(user_id);

    info!(user_id = %user_id, revoked, "Password changed");

    Ok((RateLimitHeaders(limit), Json(CountResponse { revoked })))
}
