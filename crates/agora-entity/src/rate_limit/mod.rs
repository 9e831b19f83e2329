//! Rate-limit counter entities.

pub mod counter;

pub use counter::RateLimitCounter;
