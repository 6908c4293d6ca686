//! Voice responses returned to the telephony provider
//!
//! The call flow produces an ordered list of verbs (speak, gather digits,
//! record, play, redirect, hang up); the HTTP layer renders it as TwiML.

mod response;

pub use response::{Gather, Record, Verb, VoiceResponse};
