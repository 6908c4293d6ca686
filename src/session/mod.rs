//! Caller session management
//!
//! This module provides:
//! - `Session`: per-caller call state, saved answers and pending recording
//! - `SessionStore`: concurrent in-memory store with per-caller locking
//! - Idle eviction for calls that were abandoned mid-flow

mod session;
mod stats;
mod store;

pub use session::{Answer, CallState, Recording, Session};
pub use stats::StoreStats;
pub use store::SessionStore;
