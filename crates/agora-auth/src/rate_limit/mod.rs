//! Fixed-window rate limiting for sensitive actions.

pub mod action;
pub mod limiter;

pub use action::RateLimitAction;
pub use limiter::RateLimiter;
