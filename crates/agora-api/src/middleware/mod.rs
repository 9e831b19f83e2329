//! HTTP middleware and response decorators.

pub mod cors;
pub mod logging;
pub mod rate_limit;
