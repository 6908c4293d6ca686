use super::entry::{JournalEntry, TranscriptNote};
use super::writer::DocumentWriter;
use crate::nats::{JournalEntryMessage, NatsClient, TranscriptNoteMessage};
use anyhow::Result;

/// Publishes journal entries to NATS for an external document service
pub struct NatsJournal {
    client: NatsClient,
    entry_subject: String,
    transcript_subject: String,
}

impl NatsJournal {
    pub fn new(client: NatsClient, entry_subject: String, transcript_subject: String) -> Self {
        Self {
            client,
            entry_subject,
            transcript_subject,
        }
    }
}

#[async_trait::async_trait]
impl DocumentWriter for NatsJournal {
    async fn append_entry(&self, entry: &JournalEntry) -> Result<()> {
        self.client
            .publish_json(&self.entry_subject, &JournalEntryMessage::from(entry))
            .await
    }

    async fn append_transcript(&self, note: &TranscriptNote) -> Result<()> {
        self.client
            .publish_json(&self.transcript_subject, &TranscriptNoteMessage::from(note))
            .await
    }

    fn name(&self) -> &str {
        "nats"
    }
}
