//! In-process repository backend.
//!
//! Holds everything in `dashmap` shards. Suitable for a single node, local
//! development and tests; state is lost on restart.

pub mod session;
pub mod user;

pub use session::MemorySessionRepository;
pub use user::MemoryUserRepository;
