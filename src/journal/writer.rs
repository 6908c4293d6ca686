use super::entry::{JournalEntry, TranscriptNote};
use anyhow::Result;

/// Destination for completed journal entries
///
/// Implementations:
/// - `MarkdownJournal`: appends to a Markdown file in a notes vault
/// - `NatsJournal`: publishes entries for a downstream document service
#[async_trait::async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Append a completed entry to the shared document
    async fn append_entry(&self, entry: &JournalEntry) -> Result<()>;

    /// Append a transcript that arrived after its entry was written
    async fn append_transcript(&self, note: &TranscriptNote) -> Result<()>;

    /// Writer name for logging
    fn name(&self) -> &str;
}
