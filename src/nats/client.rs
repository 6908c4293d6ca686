use anyhow::{Context, Result};
use async_nats::Client;
use serde::Serialize;
use tracing::info;

/// Thin wrapper over the NATS connection used for journal and call-back messages
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Publish a message as JSON
    pub async fn publish_json<T: Serialize>(&self, subject: &str, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        let bytes = payload.len();

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        self.client
            .flush()
            .await
            .context("Failed to flush NATS connection")?;

        info!("Published {} bytes to {}", bytes, subject);

        Ok(())
    }
}
