//! Journal document output
//!
//! Completed calls become `JournalEntry` values handed to a `DocumentWriter`.

mod entry;
mod markdown;
mod nats;
mod writer;

pub use entry::{JournalAnswer, JournalEntry, TranscriptNote};
pub use markdown::MarkdownJournal;
pub use nats::NatsJournal;
pub use writer::DocumentWriter;
