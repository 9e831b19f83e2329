//! In-memory counter store.

pub mod store;

pub use store::MemoryCounterStore;
