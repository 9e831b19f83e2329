//! Repository contracts and their PostgreSQL implementations.

pub mod session;
pub mod user;

pub use session::{PgSessionRepository, SessionRepository};
pub use user::{PgUserRepository, UserRepository};
