//! Bearer token signing, verification, and opaque session handles.

pub mod claims;
pub mod duration;
pub mod error;
pub mod service;

pub use claims::Claims;
pub use duration::parse_duration_secs;
pub use error::TokenError;
pub use service::{IssuedToken, TokenService, hash_session_token, mint_session_token};
