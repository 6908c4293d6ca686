// Integration tests for config loading

use anyhow::Result;
use std::fs;
use tempfile::TempDir;
use voice_journal::config::{Config, DocumentBackend, MAX_WRITE_BUDGET_SECS};
use voice_journal::Script;

const MINIMAL: &str = r#"
[service]
name = "voice-journal"

[service.http]
bind = "127.0.0.1"
port = 5000

[journal]
pin = "1234"
questions = ["What are you grateful for?", "What was hard today?"]
"#;

fn write_config(dir: &TempDir, contents: &str) -> Result<String> {
    let path = dir.path().join("voice-journal.toml");
    fs::write(&path, contents)?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn test_minimal_config_uses_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = Config::load(&write_config(&dir, MINIMAL)?)?;

    assert_eq!(cfg.service.http.port, 5000);
    assert_eq!(cfg.journal.questions.len(), 2);
    assert_eq!(cfg.journal.max_recording_secs, 300);
    assert_eq!(cfg.journal.finish_on_key, "#");
    assert!(cfg.journal.transcribe);
    assert_eq!(cfg.journal.idle_timeout_secs, 1800);
    assert_eq!(cfg.document.backend, DocumentBackend::Markdown);
    assert_eq!(cfg.document.retries, 1);
    assert!(
        cfg.document.write_timeout_secs * (u64::from(cfg.document.retries) + 1)
            <= MAX_WRITE_BUDGET_SECS
    );
    assert!(cfg.nats.url.is_none());
    assert!(!cfg.sms.enabled);
    Ok(())
}

#[test]
fn test_script_from_config() -> Result<()> {
    let dir = TempDir::new()?;
    let contents = MINIMAL.replace(
        "port = 5000",
        "port = 5000\npublic_url = \"https://journal.example.com/\"",
    );
    let cfg = Config::load(&write_config(&dir, &contents)?)?;

    let script = Script::from_config(&cfg);

    assert_eq!(script.pin, "1234");
    assert_eq!(script.question_count(), 2);
    assert_eq!(script.base_url, "https://journal.example.com");
    assert_eq!(script.url("/voice"), "https://journal.example.com/voice");
    Ok(())
}

#[test]
fn test_non_numeric_pin_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let contents = MINIMAL.replace("pin = \"1234\"", "pin = \"12a4\"");

    assert!(Config::load(&write_config(&dir, &contents)?).is_err());
    Ok(())
}

#[test]
fn test_nats_backend_requires_url() -> Result<()> {
    let dir = TempDir::new()?;
    let contents = format!("{}\n[document]\nbackend = \"nats\"\n", MINIMAL);

    assert!(Config::load(&write_config(&dir, &contents)?).is_err());
    Ok(())
}

#[test]
fn test_document_path_expands_home() -> Result<()> {
    let dir = TempDir::new()?;
    let contents = format!("{}\n[document]\npath = \"~/journal.md\"\n", MINIMAL);
    let cfg = Config::load(&write_config(&dir, &contents)?)?;

    assert!(!cfg.document_path().to_string_lossy().starts_with('~'));
    assert!(cfg.document_path().ends_with("journal.md"));
    Ok(())
}

#[test]
fn test_write_budget_over_ceiling_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let contents = format!(
        "{}\n[document]\nwrite_timeout_secs = 10\nretries = 1\n",
        MINIMAL
    );

    assert!(Config::load(&write_config(&dir, &contents)?).is_err());
    Ok(())
}

#[test]
fn test_non_numeric_admin_pin_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let contents = MINIMAL.replace("pin = \"1234\"", "pin = \"1234\"\nadmin_pin = \"pastor\"");

    assert!(Config::load(&write_config(&dir, &contents)?).is_err());
    Ok(())
}

#[test]
fn test_numeric_admin_pin_is_accepted() -> Result<()> {
    let dir = TempDir::new()?;
    let contents = MINIMAL.replace("pin = \"1234\"", "pin = \"1234\"\nadmin_pin = \"9876\"");
    let cfg = Config::load(&write_config(&dir, &contents)?)?;

    assert_eq!(cfg.journal.admin_pin.as_deref(), Some("9876"));
    Ok(())
}
