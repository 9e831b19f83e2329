//! Application builder: wires stores, services, and the router, then serves.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;

use agora_auth::SessionSweeper;
use agora_cache::{CounterManager, CounterStore};
use agora_core::config::AppConfig;
use agora_core::error::AppError;
use agora_core::traits::{Clock, SystemClock};
use agora_database::Repositories;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the Agora gateway until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Agora server...");

    // ── Step 1: Session/user store ───────────────────────────────
    tracing::info!(
        provider = %config.database.provider,
        "Initializing session store..."
    );
    let repositories = Repositories::from_config(&config.database).await?;

    // ── Step 2: Counter store ────────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing counter store...");
    let counters: Arc<dyn CounterStore> = Arc::new(CounterManager::new(&config.cache).await?);

    // ── Step 3: Services ─────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(config, repositories.clone(), counters, clock)?;

    // ── Step 4: Shutdown channel & sweeper ───────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = SessionSweeper::new(
        Arc::clone(&state.sessions),
        Arc::clone(&state.rate_limiter),
        Duration::from_secs(state.config.session.cleanup_interval_seconds.max(1)),
    );
    let sweeper_handle = sweeper.spawn(shutdown_rx);

    // ── Step 5: HTTP server ──────────────────────────────────────
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Agora server listening on {}", addr);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 6: Drain background tasks ───────────────────────────
    if tokio::time::timeout(Duration::from_secs(10), sweeper_handle)
        .await
        .is_err()
    {
        tracing::warn!("Session sweeper did not stop in time");
    }
    repositories.close().await;

    tracing::info!("Agora server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
