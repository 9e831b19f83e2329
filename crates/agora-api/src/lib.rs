//! # agora-api
//!
//! HTTP API layer for Agora built on Axum.
//!
//! Provides the auth, session management, and password endpoints, the
//! `AuthUser` extractor, rate-limit headers, request logging, and the
//! mapping from `AppError` to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
