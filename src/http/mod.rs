//! Webhook API for the telephony provider
//!
//! - POST /voice - Call entry (GET accepted too)
//! - POST /handle-pin - PIN digits
//! - POST /recording-complete?question=N - Finished recording
//! - POST /menu-choice?question=N - Save / re-record / review choice
//! - POST /transcription - Transcription callback
//! - POST /sms - Schedule a call back to the sender
//! - GET /status - Session and broadcast status
//! - GET|POST /wake, GET /health - Keep-alive

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
