//! "Manage devices" handlers.

use axum::Json;
use axum::extract::{Path, State};
use tracing::info;
use uuid::Uuid;

use agora_auth::RateLimitAction;
use agora_core::error::AppError;

use crate::dto::request::RevokeAllRequest;
use crate::dto::response::{CountResponse, MessageResponse, SessionResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rate_limit::RateLimitHeaders;
use crate::state::AppState;

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(RateLimitHeaders, Json<Vec<SessionResponse>>), ApiError> {
    let user_id = auth.user_id();
    let limit = state
        .rate_limiter
        .enforce(RateLimitAction::SessionList, &user_id.to_string())
        .await?;

    let manager = state.sessions.clone();
    let sessions = state
        .session_listings
        .get(user_id, move || async move {
            manager.get_active_sessions(user_id).await
        })
        .await?;

    let rows = sessions
        .iter()
        .map(|s| SessionResponse::from_session(s, auth.session.id))
        .collect();

    Ok((RateLimitHeaders(limit), Json(rows)))
}

/// DELETE /api/sessions/{id}
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = auth.user_id();

    // Someone else's session is reported exactly like a missing one.
    let owned = state
        .sessions
        .find_session(session_id)
        .await?
        .filter(|s| s.user_id == user_id);
    if owned.is_none() {
        return Err(AppError::not_found("Session not found").into());
    }

    state.sessions.revoke_session(session_id).await?;
    state.invalidate_session_listing(user_id);

    info!(user_id = %user_id, session_id = %session_id, "Session revoked by owner");

    Ok(Json(MessageResponse::new("Session revoked")))
}

/// PUT /api/sessions
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RevokeAllRequest>,
) -> Result<Json<CountResponse>, ApiError> {
    let user_id = auth.user_id();
    let except = req.keep_current.then_some(auth.session.id);

    let revoked = state.sessions.revoke_all_sessions(user_id, except).await?;
    state.invalidate_session_listing(user_id);

    info!(user_id = %user_id, revoked, keep_current = req.keep_current, "Sessions revoked");

    Ok(Json(CountResponse { revoked }))
}
