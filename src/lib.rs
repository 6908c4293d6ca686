pub mod config;
pub mod flow;
pub mod http;
pub mod journal;
pub mod nats;
pub mod session;
pub mod telephony;
pub mod voice;

pub use config::Config;
pub use flow::{CallFlow, Script, WritePolicy};
pub use http::{create_router, AppState};
pub use journal::{DocumentWriter, JournalEntry, MarkdownJournal, NatsJournal};
pub use nats::NatsClient;
pub use session::{CallState, Session, SessionStore};
pub use telephony::{CallRequester, NatsCallRequester};
pub use voice::VoiceResponse;
