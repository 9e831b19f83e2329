//! Route definitions.

use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::state::AppState;

/// Builds the complete application router, everything mounted under `/api`.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/refresh", post(handlers::auth::refresh));

    let session_routes = Router::new()
        .route(
            "/",
            get(handlers::sessions::list_sessions).put(handlers::sessions::revoke_all_sessions),
        )
        .route("/{id}", delete(handlers::sessions::revoke_session));

    let user_routes = Router::new().route("/me/password", put(handlers::users::change_password));

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/sessions", session_routes)
        .nest("/users", user_routes);

    let cors = build_cors_layer(&state.config.server);

    Router::new()
        .nest("/api", api_routes)
        .layer(from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
