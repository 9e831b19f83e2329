//! # agora-entity
//!
//! Domain entity models for Agora. Database-backed entities derive
//! `sqlx::FromRow`; all of them derive `Debug`, `Clone`, `Serialize`,
//! and `Deserialize`.

pub mod rate_limit;
pub mod session;
pub mod user;
