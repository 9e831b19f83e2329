//! # agora-database
//!
//! The keyed store behind sessions and users. Repository traits live in
//! [`repositories`]; [`memory`] holds the in-process backend and the
//! `Pg*` types in [`repositories`] hold the PostgreSQL backend.
//! [`provider::Repositories`] picks one from configuration and, for
//! PostgreSQL, applies the `migrations/` directory on connect.

pub mod memory;
pub mod provider;
pub mod repositories;

pub use provider::Repositories;
pub use repositories::{SessionRepository, UserRepository};
