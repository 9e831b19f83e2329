//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
///
/// Liveness plus a reachability check of both stores. Answers 503 when
/// either store is down.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state
        .repositories
        .health_check()
        .await
        .inspect_err(|e| warn!(error = %e, "Session store health check failed"))
        .unwrap_or(false);
    let cache = state
        .counters
        .health_check()
        .await
        .inspect_err(|e| warn!(error = %e, "Counter store health check failed"))
        .unwrap_or(false);

    let healthy = database && cache;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database,
            cache,
        }),
    )
}
