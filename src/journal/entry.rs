use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One question and the caller's saved answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalAnswer {
    pub question: String,
    pub recording_url: String,
    pub transcript: Option<String>,
}

/// A completed journaling call, ready to be appended to the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    pub caller_id: String,
    pub call_sid: Option<String>,
    pub completed_at: DateTime<Utc>,
    /// In question order
    pub answers: Vec<JournalAnswer>,
}

impl JournalEntry {
    /// Build an entry from a session's saved answers, paired with their question text
    pub fn from_session(session: &Session, questions: &[String]) -> Self {
        let answers = session
            .answers
            .iter()
            .map(|(index, answer)| JournalAnswer {
                question: questions
                    .get(*index)
                    .cloned()
                    .unwrap_or_else(|| format!("Question {}", index + 1)),
                recording_url: answer.recording_url.clone(),
                transcript: answer.transcript.clone(),
            })
            .collect();

        Self {
            entry_id: Uuid::new_v4(),
            caller_id: session.caller_id.clone(),
            call_sid: session.call_sid.clone(),
            completed_at: Utc::now(),
            answers,
        }
    }

    /// Markdown block appended to the journal document
    pub fn to_markdown(&self) -> String {
        let mut text = format!(
            "\n---\n\n## Entry: {}\n\nCaller: {}\n",
            self.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.caller_id
        );

        for (i, answer) in self.answers.iter().enumerate() {
            text.push_str(&format!("\n### {}. {}\n\n", i + 1, answer.question));
            let transcript = answer
                .transcript
                .as_deref()
                .unwrap_or("(transcript pending)");
            text.push_str(&format!("Transcript:\n{}\n\n", transcript));
            text.push_str(&format!("Recording: {}\n", answer.recording_url));
        }

        text
    }
}

/// A transcript that arrived after its call was already written to the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptNote {
    pub caller_id: String,
    pub recording_url: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl TranscriptNote {
    pub fn new(caller_id: &str, recording_url: &str, text: &str) -> Self {
        Self {
            caller_id: caller_id.to_string(),
            recording_url: recording_url.to_string(),
            text: text.to_string(),
            received_at: Utc::now(),
        }
    }

    pub fn to_markdown(&self) -> String {
        format!(
            "\n> Transcript ({}, {}): {}\n> Recording: {}\n",
            self.caller_id,
            self.received_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.text,
            self.recording_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Answer;

    fn session_with_answers() -> Session {
        let mut session = Session::new("+15550001111");
        session.call_sid = Some("CA1".to_string());
        for (i, url) in ["https://rec/a", "https://rec/b"].iter().enumerate() {
            session.answers.insert(
                i,
                Answer {
                    recording_url: url.to_string(),
                    transcript: (i == 0).then(|| "thankful".to_string()),
                    saved_at: Utc::now(),
                },
            );
        }
        session
    }

    #[test]
    fn test_entry_pairs_questions_in_order() {
        let questions = vec!["What went well?".to_string(), "What was hard?".to_string()];
        let entry = JournalEntry::from_session(&session_with_answers(), &questions);

        assert_eq!(entry.caller_id, "+15550001111");
        assert_eq!(entry.answers.len(), 2);
        assert_eq!(entry.answers[0].question, "What went well?");
        assert_eq!(entry.answers[0].recording_url, "https://rec/a");
        assert_eq!(entry.answers[1].question, "What was hard?");
        assert_eq!(entry.answers[1].transcript, None);
    }

    #[test]
    fn test_markdown_lists_each_answer() {
        let questions = vec!["What went well?".to_string(), "What was hard?".to_string()];
        let text = JournalEntry::from_session(&session_with_answers(), &questions).to_markdown();

        assert!(text.contains("## Entry: "));
        assert!(text.contains("### 1. What went well?"));
        assert!(text.contains("thankful"));
        assert!(text.contains("### 2. What was hard?"));
        assert!(text.contains("(transcript pending)"));
        assert!(text.contains("Recording: https://rec/b"));
    }
}
