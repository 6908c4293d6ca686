use super::broadcast::{Broadcast, BroadcastBoard};
use super::machine::{self, CallEvent, Effect};
use super::prompts;
use super::script::{paths, Script};
use crate::config::MAX_WRITE_BUDGET_SECS;
use crate::journal::{DocumentWriter, JournalEntry, TranscriptNote};
use crate::session::{CallState, Session, SessionStore, StoreStats};
use crate::telephony::CallRequester;
use crate::voice::VoiceResponse;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const NO_TRANSCRIPT: &str = "No transcription available";

/// Bounds on the journal write made when a call completes
#[derive(Debug, Clone, Copy)]
pub struct WritePolicy {
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retries after the first failed attempt
    pub retries: u32,
}

impl WritePolicy {
    /// Total time the completion webhook may spend writing, capped at
    /// `MAX_WRITE_BUDGET_SECS` whatever the per-attempt settings
    pub fn budget(&self) -> Duration {
        self.timeout
            .saturating_mul(self.retries.saturating_add(1))
            .min(Duration::from_secs(MAX_WRITE_BUDGET_SECS))
    }
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            retries: 1,
        }
    }
}

struct Callbacks {
    requester: Arc<dyn CallRequester>,
    delay: Duration,
}

/// Snapshot reported by the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct FlowStatus {
    #[serde(flatten)]
    pub sessions: StoreStats,
    pub questions: usize,
    pub broadcast_available: bool,
}

/// Drives caller sessions through the journaling flow
///
/// Each webhook locks the caller's session for its whole duration, runs one
/// state machine transition and carries out the resulting side effect.
pub struct CallFlow {
    script: Arc<Script>,
    sessions: SessionStore,
    broadcasts: BroadcastBoard,
    writer: Arc<dyn DocumentWriter>,
    write_policy: WritePolicy,
    callbacks: Option<Callbacks>,
}

impl CallFlow {
    pub fn new(script: Script, sessions: SessionStore, writer: Arc<dyn DocumentWriter>) -> Self {
        Self {
            script: Arc::new(script),
            sessions,
            broadcasts: BroadcastBoard::new(),
            writer,
            write_policy: WritePolicy::default(),
            callbacks: None,
        }
    }

    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Enable SMS-triggered call-backs
    pub fn with_callbacks(mut self, requester: Arc<dyn CallRequester>, delay: Duration) -> Self {
        self.callbacks = Some(Callbacks { requester, delay });
        self
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn broadcasts(&self) -> &BroadcastBoard {
        &self.broadcasts
    }

    /// Entry webhook: a (new) call from `caller`. Digits already gathered by
    /// the provider are treated as the PIN.
    pub async fn call_started(
        &self,
        caller: &str,
        call_sid: Option<String>,
        digits: Option<String>,
    ) -> VoiceResponse {
        let session = self.sessions.get_or_create(caller).await;

        match digits.filter(|d| !d.trim().is_empty()) {
            Some(digits) => {
                self.run(caller, session, CallEvent::PinEntered { digits: Some(digits) })
                    .await
            }
            None => {
                info!("Incoming call from {} ({:?})", caller, call_sid);
                self.run(caller, session, CallEvent::CallStarted { call_sid })
                    .await
            }
        }
    }

    pub async fn pin_entered(&self, caller: &str, digits: Option<String>) -> VoiceResponse {
        self.dispatch(caller, CallEvent::PinEntered { digits }).await
    }

    pub async fn recording_finished(
        &self,
        caller: &str,
        recording_url: Option<String>,
        question: Option<usize>,
    ) -> VoiceResponse {
        self.dispatch(
            caller,
            CallEvent::RecordingFinished {
                recording_url,
                question,
            },
        )
        .await
    }

    pub async fn menu_choice(
        &self,
        caller: &str,
        digit: Option<String>,
        question: Option<usize>,
    ) -> VoiceResponse {
        self.dispatch(caller, CallEvent::MenuChoice { digit, question })
            .await
    }

    /// Transcription callback: attach to the live session, or append a note
    /// when the entry has already been written
    pub async fn transcription(
        &self,
        caller: &str,
        recording_url: Option<String>,
        text: Option<String>,
    ) {
        let Some(recording_url) = recording_url else {
            warn!("Transcription from {} without a recording URL, ignoring", caller);
            return;
        };
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| NO_TRANSCRIPT.to_string());

        if let Some(session) = self.sessions.get(caller).await {
            let mut session = session.lock().await;
            if session.state != CallState::Completed
                && session.attach_transcript(&recording_url, &text)
            {
                info!("Attached transcript for {} to live session", recording_url);
                return;
            }
        }

        let note = TranscriptNote::new(caller, &recording_url, &text);
        if let Err(e) = self.writer.append_transcript(&note).await {
            error!(
                "Failed to append transcript for {} via {}: {:#}",
                recording_url,
                self.writer.name(),
                e
            );
        }
    }

    /// SMS webhook: schedule a call back to the sender
    pub fn sms_received(&self, caller: &str) -> VoiceResponse {
        let Some(callbacks) = &self.callbacks else {
            info!("SMS from {} but call-backs are disabled", caller);
            return VoiceResponse::new().message(prompts::SMS_UNAVAILABLE);
        };

        let requester = Arc::clone(&callbacks.requester);
        let delay = callbacks.delay;
        let caller = caller.to_string();
        let voice_url = self.script.url(paths::VOICE);

        info!("Scheduling call-back to {} in {}s", caller, delay.as_secs());
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match requester.request_call(&caller, &voice_url).await {
                Ok(()) => info!("Requested call-back to {}", caller),
                Err(e) => error!("Failed to request call-back to {}: {:#}", caller, e),
            }
        });

        VoiceResponse::new().message(prompts::SMS_CALLBACK)
    }

    pub async fn status(&self) -> FlowStatus {
        FlowStatus {
            sessions: self.sessions.stats().await,
            questions: self.script.question_count(),
            broadcast_available: self.broadcasts.current().await.is_some(),
        }
    }

    async fn dispatch(&self, caller: &str, event: CallEvent) -> VoiceResponse {
        match self.sessions.get(caller).await {
            Some(session) => self.run(caller, session, event).await,
            None => {
                warn!("No session for caller {} ({:?}), asking them to call back", caller, event);
                self.script.goodbye(prompts::SESSION_EXPIRED)
            }
        }
    }

    async fn run(
        &self,
        caller: &str,
        session: Arc<Mutex<Session>>,
        event: CallEvent,
    ) -> VoiceResponse {
        let broadcast = self.broadcasts.current().await;

        let mut guard = session.lock().await;
        guard.touch();
        let step = machine::transition(&mut guard, event, &self.script, broadcast.as_ref());

        match step.effect {
            None => step.response,
            Some(Effect::Discard) => {
                self.sessions.delete(caller, &session).await;
                step.response
            }
            Some(Effect::PublishBroadcast(recording)) => {
                self.broadcasts
                    .publish(Broadcast {
                        recording_url: recording.url,
                        recorded_at: Utc::now(),
                        recorded_by: caller.to_string(),
                    })
                    .await;
                self.sessions.delete(caller, &session).await;
                step.response
            }
            Some(Effect::Finalize) => {
                let entry = JournalEntry::from_session(&guard, &self.script.questions);
                info!(
                    "Call from {} completed after {}s",
                    caller,
                    (Utc::now() - guard.started_at).num_seconds()
                );
                self.sessions.delete(caller, &session).await;
                drop(guard);

                let closing = if self.write_entry(&entry).await {
                    prompts::JOURNAL_SAVED
                } else {
                    prompts::JOURNAL_SAVE_FAILED
                };
                step.response.then(self.script.goodbye(closing))
            }
        }
    }

    /// Bounded, logged journal write; never fails the call
    async fn write_entry(&self, entry: &JournalEntry) -> bool {
        let budget = self.write_policy.budget();

        match tokio::time::timeout(budget, self.attempt_writes(entry)).await {
            Ok(true) => true,
            Ok(false) => {
                error!(
                    "Giving up on journal entry {} for {}; it will not be saved",
                    entry.entry_id, entry.caller_id
                );
                false
            }
            Err(_) => {
                error!(
                    "Journal entry {} for {} not written within {}s; it will not be saved",
                    entry.entry_id,
                    entry.caller_id,
                    budget.as_secs()
                );
                false
            }
        }
    }

    async fn attempt_writes(&self, entry: &JournalEntry) -> bool {
        let attempts = self.write_policy.retries.saturating_add(1);

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.write_policy.timeout, self.writer.append_entry(entry))
                .await
            {
                Ok(Ok(())) => {
                    info!(
                        "Journal entry {} for {} written via {} ({} answers)",
                        entry.entry_id,
                        entry.caller_id,
                        self.writer.name(),
                        entry.answers.len()
                    );
                    return true;
                }
                Ok(Err(e)) => error!(
                    "Journal write {}/{} for {} failed: {:#}",
                    attempt, attempts, entry.caller_id, e
                ),
                Err(_) => error!(
                    "Journal write {}/{} for {} timed out after {}s",
                    attempt,
                    attempts,
                    entry.caller_id,
                    self.write_policy.timeout.as_secs()
                ),
            }
        }
        false
    }
}
