use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use voice_journal::config::DocumentBackend;
use voice_journal::{
    create_router, AppState, CallFlow, Config, DocumentWriter, MarkdownJournal,
    NatsCallRequester, NatsClient, NatsJournal, Script, SessionStore, WritePolicy,
};

#[derive(Parser)]
#[command(name = "voice-journal")]
#[command(about = "Phone-based guided voice journal")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-journal")]
    config: String,

    /// Override the HTTP port from the config
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Voice Journal v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("{} question(s) configured", cfg.journal.questions.len());

    let nats = match &cfg.nats.url {
        Some(url) => Some(NatsClient::connect(url).await?),
        None => None,
    };

    let writer: Arc<dyn DocumentWriter> = match (cfg.document.backend, &nats) {
        (DocumentBackend::Nats, Some(client)) => {
            info!("Journal entries published to NATS subject {}", cfg.nats.entry_subject);
            Arc::new(NatsJournal::new(
                client.clone(),
                cfg.nats.entry_subject.clone(),
                cfg.nats.transcript_subject.clone(),
            ))
        }
        (DocumentBackend::Nats, None) => anyhow::bail!("NATS journal backend requires nats.url"),
        (DocumentBackend::Markdown, _) => {
            let path = cfg.document_path();
            info!("Journal document: {}", path.display());
            Arc::new(MarkdownJournal::new(path, cfg.document.title.clone()))
        }
    };

    let sessions = SessionStore::new(cfg.idle_timeout());
    let _eviction = sessions.spawn_eviction(cfg.sweep_interval());

    let mut flow = CallFlow::new(Script::from_config(&cfg), sessions, writer).with_write_policy(
        WritePolicy {
            timeout: Duration::from_secs(cfg.document.write_timeout_secs),
            retries: cfg.document.retries,
        },
    );

    if cfg.sms.enabled {
        match &nats {
            Some(client) => {
                info!("SMS call-backs enabled ({}s delay)", cfg.sms.callback_delay_secs);
                flow = flow.with_callbacks(
                    Arc::new(NatsCallRequester::new(
                        client.clone(),
                        cfg.nats.call_request_subject.clone(),
                    )),
                    Duration::from_secs(cfg.sms.callback_delay_secs),
                );
            }
            None => tracing::warn!("sms.enabled is set but nats.url is missing; call-backs disabled"),
        }
    }

    let app = create_router(AppState::new(flow, cfg.service.name.clone()));

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
