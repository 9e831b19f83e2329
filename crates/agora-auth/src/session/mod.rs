//! Session lifecycle: creation under the concurrent-session cap,
//! validation, revocation, and cleanup.

pub mod manager;

pub use manager::{CreatedSession, SessionCheck, SessionManager};
