use crate::journal::{JournalAnswer, JournalEntry, TranscriptNote};
use serde::{Deserialize, Serialize};

/// Completed journal entry published for the document service
#[derive(Debug, Serialize, Deserialize)]
pub struct JournalEntryMessage {
    pub entry_id: String,
    pub caller_id: String,
    pub call_sid: Option<String>,
    pub timestamp: String, // RFC3339 timestamp
    pub answers: Vec<JournalAnswer>,
}

impl From<&JournalEntry> for JournalEntryMessage {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            entry_id: entry.entry_id.to_string(),
            caller_id: entry.caller_id.clone(),
            call_sid: entry.call_sid.clone(),
            timestamp: entry.completed_at.to_rfc3339(),
            answers: entry.answers.clone(),
        }
    }
}

/// Transcript that arrived after its entry was published
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptNoteMessage {
    pub caller_id: String,
    pub recording_url: String,
    pub text: String,
    pub timestamp: String, // RFC3339 timestamp
}

impl From<&TranscriptNote> for TranscriptNoteMessage {
    fn from(note: &TranscriptNote) -> Self {
        Self {
            caller_id: note.caller_id.clone(),
            recording_url: note.recording_url.clone(),
            text: note.text.clone(),
            timestamp: note.received_at.to_rfc3339(),
        }
    }
}

/// Request for the telephony transport to call a number back
#[derive(Debug, Serialize, Deserialize)]
pub struct OutboundCallMessage {
    pub to: String,
    /// Webhook the transport should fetch when the call connects
    pub voice_url: String,
    pub requested_at: String, // RFC3339 timestamp
    pub reason: String,
}
