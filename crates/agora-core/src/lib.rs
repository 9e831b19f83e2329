//! # agora-core
//!
//! Core crate for Agora. Contains configuration schemas, the unified
//! error system, rate-limit outcome types, the clock abstraction shared
//! by the session and rate-limit services, and URL redaction for logs.
//!
//! This crate has **no** internal dependencies on other Agora crates.

pub mod config;
pub mod error;
pub mod redact;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, AuthFailure, ErrorKind};
pub use result::AppResult;
