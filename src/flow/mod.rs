//! Journaling call flow
//!
//! - `machine`: pure state transitions for one webhook event
//! - `CallFlow`: session locking, side effects (journal write, broadcast), SMS call-backs
//! - `Script`: questions, PIN and the voice prompts built from them

mod broadcast;
mod controller;
pub mod machine;
pub mod prompts;
mod script;

pub use broadcast::{Broadcast, BroadcastBoard};
pub use controller::{CallFlow, FlowStatus, WritePolicy};
pub use machine::{transition, CallEvent, Effect, Step};
pub use script::{paths, Script};
