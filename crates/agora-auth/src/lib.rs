//! # agora-auth
//!
//! Session lifecycle and request throttling for Agora.
//!
//! ## Modules
//!
//! - `jwt`: bearer token signing, verification, and session handle minting
//! - `session`: session creation with the concurrent-session cap, validation, revocation
//! - `rate_limit`: fixed-window per-action limits with block/log enforcement
//! - `password`: Argon2id password hashing
//! - `sweeper`: periodic expired-session and counter cleanup

pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod sweeper;

pub use jwt::{Claims, IssuedToken, TokenError, TokenService};
pub use password::PasswordHasher;
pub use rate_limit::{RateLimitAction, RateLimiter};
pub use session::{CreatedSession, SessionCheck, SessionManager};
pub use sweeper::SessionSweeper;
