//! Route handlers organized by domain.

pub mod auth;
pub mod health;
pub mod sessions;
pub mod users;

use agora_core::error::AppError;

/// Runs CPU-bound work (password hashing) off the async workers.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {e}")))?
}
