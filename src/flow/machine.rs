//! Call flow state machine
//!
//! `transition` is a pure function of the session, the inbound webhook event,
//! and the deployment script. It mutates the session's state and answers and
//! returns the voice response plus at most one side effect for the controller
//! to carry out. It never touches the store, the journal or the network.
//!
//! The question index carried in action URLs is only a hint: when it disagrees
//! with the session, the event is treated as a stale or duplicate delivery and
//! the current prompt is re-issued without changing anything.

use super::broadcast::Broadcast;
use super::prompts;
use super::script::Script;
use crate::session::{Answer, CallState, Recording, Session};
use crate::voice::VoiceResponse;
use chrono::Utc;
use tracing::{debug, warn};

/// Inbound signal from a webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// A call reached the entry webhook
    CallStarted { call_sid: Option<String> },

    /// PIN gather finished (digits absent on timeout)
    PinEntered { digits: Option<String> },

    /// Record verb finished (no URL when nothing was recorded)
    RecordingFinished {
        recording_url: Option<String>,
        question: Option<usize>,
    },

    /// Menu gather finished (digit absent on timeout)
    MenuChoice {
        digit: Option<String>,
        question: Option<usize>,
    },
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Every question is answered: write the journal entry, then discard the session
    Finalize,

    /// Admin saved a new broadcast; discard the session afterwards
    PublishBroadcast(Recording),

    /// Session ended with nothing to persist
    Discard,
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub response: VoiceResponse,
    pub effect: Option<Effect>,
}

impl Step {
    fn reply(response: VoiceResponse) -> Self {
        Self {
            response,
            effect: None,
        }
    }

    fn with_effect(response: VoiceResponse, effect: Effect) -> Self {
        Self {
            response,
            effect: Some(effect),
        }
    }
}

/// Caller's choice in a save/re-record/review menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Save,
    ReRecord,
    Review,
    Invalid,
}

impl MenuChoice {
    fn parse(digit: Option<&str>) -> Self {
        match digit.map(|d| d.trim().trim_end_matches('#')) {
            Some("1") => MenuChoice::Save,
            Some("2") => MenuChoice::ReRecord,
            Some("3") => MenuChoice::Review,
            _ => MenuChoice::Invalid,
        }
    }
}

/// Apply `event` to `session`
pub fn transition(
    session: &mut Session,
    event: CallEvent,
    script: &Script,
    broadcast: Option<&Broadcast>,
) -> Step {
    match (session.state.clone(), event) {
        (_, CallEvent::CallStarted { call_sid }) => {
            if call_sid.is_some() && session.call_sid == call_sid && !session.state.is_terminal() {
                debug!("Repeated entry webhook for call {:?}", call_sid);
                return resume(session, script);
            }
            session.restart(call_sid);
            Step::reply(
                VoiceResponse::new()
                    .pause(script.answer_delay_secs)
                    .then(script.pin_prompt(None)),
            )
        }

        (CallState::AwaitingPin { attempts }, CallEvent::PinEntered { digits }) => {
            enter_pin(session, attempts, digits, script, broadcast)
        }

        (
            CallState::AskingQuestion { index },
            CallEvent::RecordingFinished {
                recording_url,
                question,
            },
        ) => {
            if is_stale(question, index) {
                return resume(session, script);
            }
            match recording_url {
                Some(url) => {
                    session.state = CallState::AwaitingMenuChoice {
                        index,
                        pending: Recording::new(url),
                        reprompts: 0,
                    };
                    Step::reply(script.answer_menu(index))
                }
                None => Step::reply(
                    VoiceResponse::new()
                        .say(prompts::NO_RECORDING)
                        .then(script.ask(index)),
                ),
            }
        }

        (
            CallState::AwaitingMenuChoice {
                index,
                pending,
                reprompts,
            },
            CallEvent::MenuChoice { digit, question },
        ) => {
            if is_stale(question, index) {
                return resume(session, script);
            }
            match MenuChoice::parse(digit.as_deref()) {
                MenuChoice::Save => save_answer(session, index, pending, script),
                MenuChoice::ReRecord => {
                    debug!("Caller {} re-recording question {}", session.caller_id, index);
                    session.state = CallState::AskingQuestion { index };
                    Step::reply(
                        VoiceResponse::new()
                            .say(prompts::TRY_AGAIN)
                            .then(script.ask(index)),
                    )
                }
                MenuChoice::Review => Step::reply(
                    VoiceResponse::new()
                        .say(prompts::PLAYBACK_INTRO)
                        .play(pending.url)
                        .then(script.answer_menu(index)),
                ),
                MenuChoice::Invalid if reprompts == 0 => {
                    session.state = CallState::AwaitingMenuChoice {
                        index,
                        pending,
                        reprompts: 1,
                    };
                    Step::reply(
                        VoiceResponse::new()
                            .say(prompts::INVALID_CHOICE)
                            .then(script.answer_menu(index)),
                    )
                }
                MenuChoice::Invalid => {
                    debug!(
                        "No valid choice from {} for question {}, saving",
                        session.caller_id, index
                    );
                    save_answer(session, index, pending, script)
                }
            }
        }

        (CallState::RecordingBroadcast, CallEvent::RecordingFinished { recording_url, .. }) => {
            match recording_url {
                Some(url) => {
                    session.state = CallState::AwaitingBroadcastChoice {
                        pending: Recording::new(url),
                        reprompts: 0,
                    };
                    Step::reply(script.broadcast_menu())
                }
                None => Step::reply(
                    VoiceResponse::new()
                        .say(prompts::NO_RECORDING)
                        .then(script.broadcast_prompt()),
                ),
            }
        }

        (
            CallState::AwaitingBroadcastChoice { pending, reprompts },
            CallEvent::MenuChoice { digit, .. },
        ) => match MenuChoice::parse(digit.as_deref()) {
            MenuChoice::ReRecord => {
                session.state = CallState::RecordingBroadcast;
                Step::reply(
                    VoiceResponse::new()
                        .say(prompts::TRY_AGAIN)
                        .then(script.broadcast_prompt()),
                )
            }
            MenuChoice::Review => Step::reply(
                VoiceResponse::new()
                    .say(prompts::PLAYBACK_INTRO)
                    .play(pending.url)
                    .then(script.broadcast_menu()),
            ),
            MenuChoice::Invalid if reprompts == 0 => {
                session.state = CallState::AwaitingBroadcastChoice {
                    pending,
                    reprompts: 1,
                };
                Step::reply(
                    VoiceResponse::new()
                        .say(prompts::INVALID_CHOICE)
                        .then(script.broadcast_menu()),
                )
            }
            MenuChoice::Save | MenuChoice::Invalid => {
                session.state = CallState::Completed;
                Step::with_effect(
                    script.goodbye(prompts::BROADCAST_SAVED),
                    Effect::PublishBroadcast(pending),
                )
            }
        },

        (_, event) => {
            debug!(
                "Event {:?} does not apply in state {}, re-prompting {}",
                event,
                session.state.name(),
                session.caller_id
            );
            resume(session, script)
        }
    }
}

fn enter_pin(
    session: &mut Session,
    attempts: u8,
    digits: Option<String>,
    script: &Script,
    broadcast: Option<&Broadcast>,
) -> Step {
    let digits = digits
        .map(|d| d.trim().trim_end_matches('#').to_string())
        .filter(|d| !d.is_empty());

    match digits {
        None if attempts == 0 => {
            session.state = CallState::AwaitingPin { attempts: 1 };
            Step::reply(script.pin_prompt(Some(prompts::PIN_NOT_RECEIVED)))
        }
        None => reject(session, script),
        Some(digits) if digits == script.pin => {
            session.answers.clear();

            let mut lead = VoiceResponse::new().say(prompts::GREETING);
            if let Some(broadcast) = broadcast {
                lead = lead
                    .say(prompts::BROADCAST_INTRO)
                    .play(broadcast.recording_url.clone());
            }
            advance(session, 0, script, lead)
        }
        Some(digits) if script.admin_pin.as_deref() == Some(digits.as_str()) => {
            session.state = CallState::RecordingBroadcast;
            Step::reply(script.broadcast_prompt())
        }
        Some(_) => reject(session, script),
    }
}

fn reject(session: &mut Session, script: &Script) -> Step {
    warn!("Rejecting caller {}: invalid PIN", session.caller_id);
    session.state = CallState::Rejected;
    Step::with_effect(script.goodbye(prompts::INVALID_PIN), Effect::Discard)
}

fn save_answer(session: &mut Session, index: usize, pending: Recording, script: &Script) -> Step {
    // An index is only ever saved once
    session.answers.entry(index).or_insert_with(|| Answer {
        recording_url: pending.url,
        transcript: pending.transcript,
        saved_at: Utc::now(),
    });

    // The closing message after the last answer depends on the journal write
    let lead = if index + 1 >= script.question_count() {
        VoiceResponse::new()
    } else {
        VoiceResponse::new().say(prompts::ANSWER_SAVED)
    };
    advance(session, index + 1, script, lead)
}

/// Move to question `next`, or complete when every question is answered
fn advance(session: &mut Session, next: usize, script: &Script, lead: VoiceResponse) -> Step {
    if next >= script.question_count() {
        session.state = CallState::Completed;
        Step::with_effect(lead, Effect::Finalize)
    } else {
        session.state = CallState::AskingQuestion { index: next };
        Step::reply(lead.then(script.ask(next)))
    }
}

/// Re-issue the prompt for the current state
fn resume(session: &mut Session, script: &Script) -> Step {
    match &session.state {
        CallState::AwaitingPin { .. } => Step::reply(script.pin_prompt(None)),
        CallState::AskingQuestion { index } => Step::reply(script.ask(*index)),
        CallState::AwaitingMenuChoice { index, .. } => Step::reply(script.answer_menu(*index)),
        CallState::RecordingBroadcast => Step::reply(script.broadcast_prompt()),
        CallState::AwaitingBroadcastChoice { .. } => Step::reply(script.broadcast_menu()),
        CallState::Completed | CallState::Rejected => {
            Step::with_effect(script.goodbye(prompts::CALL_FINISHED), Effect::Discard)
        }
    }
}

fn is_stale(hint: Option<usize>, index: usize) -> bool {
    hint.is_some_and(|q| q != index)
}
