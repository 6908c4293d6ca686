use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on the completion write, kept under the provider's 15s webhook timeout
pub const MAX_WRITE_BUDGET_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub journal: JournalConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub sms: SmsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Base URL the telephony provider uses to reach us (empty = relative action URLs)
    #[serde(default)]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// Shared caller PIN
    pub pin: String,

    /// PIN that opens the broadcast recording flow instead of the questions
    #[serde(default)]
    pub admin_pin: Option<String>,

    /// Guided questions, asked in order
    pub questions: Vec<String>,

    #[serde(default = "default_max_recording_secs")]
    pub max_recording_secs: u32,

    #[serde(default = "default_finish_on_key")]
    pub finish_on_key: String,

    /// Ask the provider to transcribe each recording
    #[serde(default = "default_true")]
    pub transcribe: bool,

    /// Pause before the PIN prompt (masks provider cold starts)
    #[serde(default)]
    pub answer_delay_secs: u32,

    #[serde(default = "default_pin_timeout_secs")]
    pub pin_timeout_secs: u32,

    #[serde(default = "default_menu_timeout_secs")]
    pub menu_timeout_secs: u32,

    /// Sessions with no webhook for this long are evicted
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentBackend {
    Markdown,
    Nats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_backend")]
    pub backend: DocumentBackend,

    /// Markdown file entries are appended to
    #[serde(default = "default_document_path")]
    pub path: String,

    #[serde(default = "default_document_title")]
    pub title: String,

    /// Per-attempt timeout; all attempts together must fit in `MAX_WRITE_BUDGET_SECS`
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Retries after the first failed append
    #[serde(default = "default_retries")]
    pub retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_entry_subject")]
    pub entry_subject: String,

    #[serde(default = "default_transcript_subject")]
    pub transcript_subject: String,

    #[serde(default = "default_call_request_subject")]
    pub call_request_subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_callback_delay_secs")]
    pub callback_delay_secs: u64,
}

fn default_max_recording_secs() -> u32 {
    300
}

fn default_finish_on_key() -> String {
    "#".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pin_timeout_secs() -> u32 {
    10
}

fn default_menu_timeout_secs() -> u32 {
    8
}

fn default_idle_timeout_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_backend() -> DocumentBackend {
    DocumentBackend::Markdown
}

fn default_document_path() -> String {
    "~/VoiceJournal/journal.md".to_string()
}

fn default_document_title() -> String {
    "Voice Journal".to_string()
}

fn default_write_timeout_secs() -> u64 {
    4
}

fn default_retries() -> u32 {
    1
}

fn default_entry_subject() -> String {
    "journal.entry".to_string()
}

fn default_transcript_subject() -> String {
    "journal.transcript".to_string()
}

fn default_call_request_subject() -> String {
    "telephony.call.request".to_string()
}

fn default_callback_delay_secs() -> u64 {
    20
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_document_path(),
            title: default_document_title(),
            write_timeout_secs: default_write_timeout_secs(),
            retries: default_retries(),
        }
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: None,
            entry_subject: default_entry_subject(),
            transcript_subject: default_transcript_subject(),
            call_request_subject: default_call_request_subject(),
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            callback_delay_secs: default_callback_delay_secs(),
        }
    }
}

impl Config {
    /// Load from a config file (extension optional), then apply
    /// `VOICE_JOURNAL__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICE_JOURNAL").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        let cfg: Self = settings
            .try_deserialize()
            .context("Invalid voice journal config")?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.journal.pin.is_empty() || !self.journal.pin.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("journal.pin must be a non-empty string of digits");
        }
        if let Some(admin) = &self.journal.admin_pin {
            if admin.is_empty() || !admin.chars().all(|c| c.is_ascii_digit()) {
                anyhow::bail!("journal.admin_pin must be a non-empty string of digits");
            }
            if admin == &self.journal.pin {
                anyhow::bail!("journal.admin_pin must differ from journal.pin");
            }
        }
        let attempts = u64::from(self.document.retries) + 1;
        let worst_case = self.document.write_timeout_secs.saturating_mul(attempts);
        if self.document.write_timeout_secs == 0 || worst_case > MAX_WRITE_BUDGET_SECS {
            anyhow::bail!(
                "document.write_timeout_secs x (retries + 1) must be between 1 and {}s, got {}s",
                MAX_WRITE_BUDGET_SECS,
                worst_case
            );
        }
        if self.document.backend == DocumentBackend::Nats && self.nats.url.is_none() {
            anyhow::bail!("document.backend = \"nats\" requires nats.url");
        }
        Ok(())
    }

    /// Document path with `~` expanded
    pub fn document_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.document.path).as_ref())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.journal.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.journal.sweep_interval_secs.max(1))
    }
}
