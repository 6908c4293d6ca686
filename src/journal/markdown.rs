use super::entry::{JournalEntry, TranscriptNote};
use super::writer::DocumentWriter;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// Appends journal entries to a single Markdown document
pub struct MarkdownJournal {
    path: PathBuf,
    title: String,
    /// Serializes appends so entries never interleave
    write_lock: Mutex<()>,
}

impl MarkdownJournal {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn append(&self, text: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create journal directory")?;
            }
        }

        let is_new = !fs::try_exists(&self.path).await.unwrap_or(false);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open journal {}", self.path.display()))?;

        if is_new {
            file.write_all(format!("# {}\n", self.title).as_bytes())
                .await
                .context("Failed to write journal header")?;
        }

        file.write_all(text.as_bytes())
            .await
            .context("Failed to append to journal")?;
        file.flush().await.context("Failed to flush journal")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentWriter for MarkdownJournal {
    async fn append_entry(&self, entry: &JournalEntry) -> Result<()> {
        self.append(&entry.to_markdown()).await?;

        info!(
            "Appended entry {} ({} answers) to {}",
            entry.entry_id,
            entry.answers.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn append_transcript(&self, note: &TranscriptNote) -> Result<()> {
        self.append(&note.to_markdown()).await?;

        info!(
            "Appended late transcript for {} to {}",
            note.recording_url,
            self.path.display()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "markdown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::JournalAnswer;
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn entry() -> JournalEntry {
        JournalEntry {
            entry_id: Uuid::new_v4(),
            caller_id: "+15550001111".to_string(),
            call_sid: None,
            completed_at: Utc::now(),
            answers: vec![JournalAnswer {
                question: "What are you grateful for?".to_string(),
                recording_url: "https://rec/a".to_string(),
                transcript: Some("My family".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_creates_document_with_header() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("journal.md");
        let journal = MarkdownJournal::new(&path, "Church Journal");

        journal.append_entry(&entry()).await?;

        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with("# Church Journal\n"));
        assert!(text.contains("What are you grateful for?"));
        assert!(text.contains("My family"));
        Ok(())
    }

    #[tokio::test]
    async fn test_appends_without_overwriting() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("journal.md");
        let journal = MarkdownJournal::new(&path, "Journal");

        journal.append_entry(&entry()).await?;
        journal.append_entry(&entry()).await?;
        journal
            .append_transcript(&TranscriptNote::new("+15550001111", "https://rec/z", "late words"))
            .await?;

        let text = std::fs::read_to_string(&path)?;
        assert_eq!(text.matches("# Journal\n").count(), 1);
        assert_eq!(text.matches("## Entry: ").count(), 2);
        assert!(text.contains("late words"));
        Ok(())
    }
}
