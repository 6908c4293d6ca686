use super::state::AppState;
use crate::flow::{prompts, FlowStatus};
use crate::voice::VoiceResponse;
use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Form fields posted by the telephony provider (all optional: a missing or
/// undecodable field is treated as absent input)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebhookForm {
    /// Caller's phone number
    pub from: Option<String>,

    /// Provider call id
    pub call_sid: Option<String>,

    /// Keys pressed during a gather
    pub digits: Option<String>,

    /// Locator of a finished recording
    pub recording_url: Option<String>,

    /// Transcription callback text
    pub transcription_text: Option<String>,
}

impl WebhookForm {
    /// Session key: the caller's number, or the call id when the number is withheld
    fn caller(&self) -> Option<&str> {
        non_empty(&self.from).or_else(|| non_empty(&self.call_sid))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `?question=N` round-tripped through action URLs
#[derive(Debug, Default, Deserialize)]
pub struct QuestionQuery {
    pub question: Option<String>,
}

impl QuestionQuery {
    fn index(&self) -> Option<usize> {
        self.question.as_deref().and_then(|q| q.trim().parse().ok())
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: String,
    #[serde(flatten)]
    pub flow: FlowStatus,
}

fn twiml(response: VoiceResponse) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        response.to_twiml(),
    )
        .into_response()
}

fn form_or_default(form: Option<Form<WebhookForm>>) -> WebhookForm {
    match form {
        Some(Form(form)) => form,
        None => {
            warn!("Unreadable webhook body, treating all fields as absent");
            WebhookForm::default()
        }
    }
}

fn question_hint(query: Option<Query<QuestionQuery>>) -> Option<usize> {
    query.and_then(|Query(q)| q.index())
}

fn unknown_caller() -> Response {
    warn!("Webhook without caller id or call sid");
    twiml(VoiceResponse::new().say(prompts::UNKNOWN_CALLER).hangup())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST|GET /voice
/// Entry point for a call
pub async fn voice(State(state): State<AppState>, form: Option<Form<WebhookForm>>) -> Response {
    let form = form_or_default(form);
    let Some(caller) = form.caller() else {
        return unknown_caller();
    };

    let response = state
        .flow
        .call_started(caller, form.call_sid.clone(), form.digits.clone())
        .await;
    twiml(response)
}

/// POST /handle-pin
pub async fn handle_pin(State(state): State<AppState>, form: Option<Form<WebhookForm>>) -> Response {
    let form = form_or_default(form);
    let Some(caller) = form.caller() else {
        return unknown_caller();
    };

    twiml(state.flow.pin_entered(caller, form.digits.clone()).await)
}

/// POST /recording-complete?question=N
pub async fn recording_complete(
    State(state): State<AppState>,
    query: Option<Query<QuestionQuery>>,
    form: Option<Form<WebhookForm>>,
) -> Response {
    let form = form_or_default(form);
    let Some(caller) = form.caller() else {
        return unknown_caller();
    };

    debug!("Recording from {}: {:?}", caller, form.recording_url);
    let response = state
        .flow
        .recording_finished(caller, form.recording_url.clone(), question_hint(query))
        .await;
    twiml(response)
}

/// POST /menu-choice?question=N
pub async fn menu_choice(
    State(state): State<AppState>,
    query: Option<Query<QuestionQuery>>,
    form: Option<Form<WebhookForm>>,
) -> Response {
    let form = form_or_default(form);
    let Some(caller) = form.caller() else {
        return unknown_caller();
    };

    let response = state
        .flow
        .menu_choice(caller, form.digits.clone(), question_hint(query))
        .await;
    twiml(response)
}

/// POST /transcription
/// Transcription callback; no voice response
pub async fn transcription(
    State(state): State<AppState>,
    form: Option<Form<WebhookForm>>,
) -> impl IntoResponse {
    let form = form_or_default(form);
    let Some(caller) = form.caller() else {
        warn!("Transcription callback without caller id");
        return StatusCode::OK;
    };

    state
        .flow
        .transcription(
            caller,
            form.recording_url.clone(),
            form.transcription_text.clone(),
        )
        .await;
    StatusCode::OK
}

/// POST /sms
/// Schedule a call back to the sender
pub async fn sms(State(state): State<AppState>, form: Option<Form<WebhookForm>>) -> Response {
    let form = form_or_default(form);
    match non_empty(&form.from) {
        Some(caller) => twiml(state.flow.sms_received(caller)),
        None => {
            warn!("SMS without sender number");
            twiml(VoiceResponse::new())
        }
    }
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        service: state.service_name.clone(),
        flow: state.flow.status().await,
    })
}

/// GET|POST /wake, GET /health
/// Keep-alive ping for hosts that idle the service
pub async fn wake() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
