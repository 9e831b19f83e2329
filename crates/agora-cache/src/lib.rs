//! # agora-cache
//!
//! Shared-state primitives for Agora:
//!
//! - [`CounterStore`] backends for fixed-window rate-limit counters:
//!   **memory** (`dashmap`) and **redis** (Lua `INCR` script).
//! - [`CoalescingCache`], a single-flight TTL cache that collapses
//!   concurrent recomputation of the same value.
//!
//! The counter backend is selected at runtime based on configuration.

pub mod coalesce;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod store;

pub use coalesce::CoalescingCache;
pub use provider::CounterManager;
pub use store::CounterStore;
