use super::handlers;
use super::state::AppState;
use crate::flow::paths;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Keep-alive
        .route("/wake", get(handlers::wake).post(handlers::wake))
        .route("/health", get(handlers::wake))
        .route("/status", get(handlers::status))
        // Call flow
        .route(paths::VOICE, post(handlers::voice).get(handlers::voice))
        .route(paths::HANDLE_PIN, post(handlers::handle_pin))
        .route(paths::RECORDING_COMPLETE, post(handlers::recording_complete))
        .route(paths::MENU_CHOICE, post(handlers::menu_choice))
        .route(paths::TRANSCRIPTION, post(handlers::transcription))
        // SMS call-back trigger
        .route("/sms", post(handlers::sms))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
