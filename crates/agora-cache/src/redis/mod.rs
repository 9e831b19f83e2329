//! Redis counter store.

pub mod store;

pub use store::RedisCounterStore;
