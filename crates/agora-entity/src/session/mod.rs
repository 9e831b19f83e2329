//! Session domain entities.

pub mod client;
pub mod model;

pub use client::ClientInfo;
pub use model::{Session, SessionState};
