use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// A recording made by the caller, identified by the provider's URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recording {
    pub url: String,
    pub transcript: Option<String>,
}

impl Recording {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transcript: None,
        }
    }
}

/// A saved answer to one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub recording_url: String,
    pub transcript: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Where a call currently is in the journaling flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    /// PIN prompt issued; `attempts` counts empty gathers so far
    AwaitingPin { attempts: u8 },

    /// Question `index` spoken, recording outstanding
    AskingQuestion { index: usize },

    /// Recording for question `index` made, waiting for save/re-record/review
    AwaitingMenuChoice {
        index: usize,
        pending: Recording,
        reprompts: u8,
    },

    /// Admin is recording the broadcast message
    RecordingBroadcast,

    /// Broadcast recorded, waiting for save/re-record/review
    AwaitingBroadcastChoice { pending: Recording, reprompts: u8 },

    Completed,

    Rejected,
}

impl CallState {
    pub fn name(&self) -> &'static str {
        match self {
            CallState::AwaitingPin { .. } => "awaiting_pin",
            CallState::AskingQuestion { .. } => "asking_question",
            CallState::AwaitingMenuChoice { .. } => "awaiting_menu_choice",
            CallState::RecordingBroadcast => "recording_broadcast",
            CallState::AwaitingBroadcastChoice { .. } => "awaiting_broadcast_choice",
            CallState::Completed => "completed",
            CallState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Completed | CallState::Rejected)
    }
}

/// Per-caller IVR session
#[derive(Debug, Clone)]
pub struct Session {
    pub caller_id: String,

    /// Provider call id of the call that owns this session
    pub call_sid: Option<String>,

    pub state: CallState,

    /// Saved answers by question index
    pub answers: BTreeMap<usize, Answer>,

    pub started_at: DateTime<Utc>,

    /// Last webhook touching this session (drives idle eviction)
    pub last_seen: Instant,
}

impl Session {
    pub fn new(caller_id: impl Into<String>) -> Self {
        Self {
            caller_id: caller_id.into(),
            call_sid: None,
            state: CallState::AwaitingPin { attempts: 0 },
            answers: BTreeMap::new(),
            started_at: Utc::now(),
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Start over for a new call from the same caller
    pub fn restart(&mut self, call_sid: Option<String>) {
        self.call_sid = call_sid;
        self.state = CallState::AwaitingPin { attempts: 0 };
        self.answers.clear();
        self.started_at = Utc::now();
        self.touch();
    }

    pub fn pin_verified(&self) -> bool {
        !matches!(
            self.state,
            CallState::AwaitingPin { .. } | CallState::Rejected
        )
    }

    /// Index of the question being worked on (equals the answer count once completed)
    pub fn current_question_index(&self) -> usize {
        match &self.state {
            CallState::AskingQuestion { index } => *index,
            CallState::AwaitingMenuChoice { index, .. } => *index,
            _ => self.answers.len(),
        }
    }

    /// Recording waiting for a save/re-record/review decision
    pub fn pending_recording(&self) -> Option<&Recording> {
        match &self.state {
            CallState::AwaitingMenuChoice { pending, .. } => Some(pending),
            CallState::AwaitingBroadcastChoice { pending, .. } => Some(pending),
            _ => None,
        }
    }

    /// Attach a transcript to the pending or saved recording with this URL.
    /// Returns false when no recording in this session matches.
    pub fn attach_transcript(&mut self, recording_url: &str, text: &str) -> bool {
        match &mut self.state {
            CallState::AwaitingMenuChoice { pending, .. }
            | CallState::AwaitingBroadcastChoice { pending, .. }
                if pending.url == recording_url =>
            {
                pending.transcript = Some(text.to_string());
                return true;
            }
            _ => {}
        }

        match self
            .answers
            .values_mut()
            .find(|answer| answer.recording_url == recording_url)
        {
            Some(answer) => {
                answer.transcript = Some(text.to_string());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_awaits_pin() {
        let session = Session::new("+15550001111");
        assert_eq!(session.state, CallState::AwaitingPin { attempts: 0 });
        assert!(!session.pin_verified());
        assert_eq!(session.current_question_index(), 0);
        assert!(session.pending_recording().is_none());
    }

    #[test]
    fn test_attach_transcript_to_pending() {
        let mut session = Session::new("+15550001111");
        session.state = CallState::AwaitingMenuChoice {
            index: 0,
            pending: Recording::new("https://rec/1"),
            reprompts: 0,
        };

        assert!(session.attach_transcript("https://rec/1", "grateful for rain"));
        assert_eq!(
            session.pending_recording().and_then(|r| r.transcript.as_deref()),
            Some("grateful for rain")
        );
        assert!(!session.attach_transcript("https://rec/2", "other"));
    }

    #[test]
    fn test_attach_transcript_to_saved_answer() {
        let mut session = Session::new("+15550001111");
        session.answers.insert(
            0,
            Answer {
                recording_url: "https://rec/1".to_string(),
                transcript: None,
                saved_at: Utc::now(),
            },
        );
        session.state = CallState::AskingQuestion { index: 1 };

        assert!(session.attach_transcript("https://rec/1", "hello"));
        assert_eq!(session.answers[&0].transcript.as_deref(), Some("hello"));
    }

    #[test]
    fn test_restart_clears_answers() {
        let mut session = Session::new("+15550001111");
        session.state = CallState::AskingQuestion { index: 2 };
        session.answers.insert(
            0,
            Answer {
                recording_url: "https://rec/1".to_string(),
                transcript: None,
                saved_at: Utc::now(),
            },
        );

        session.restart(Some("CA123".to_string()));

        assert_eq!(session.state, CallState::AwaitingPin { attempts: 0 });
        assert!(session.answers.is_empty());
        assert_eq!(session.call_sid.as_deref(), Some("CA123"));
    }
}
