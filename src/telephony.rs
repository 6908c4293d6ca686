//! Outbound requests to the telephony transport

use crate::nats::{NatsClient, OutboundCallMessage};
use anyhow::Result;
use chrono::Utc;

/// Asks the telephony transport to place a call
#[async_trait::async_trait]
pub trait CallRequester: Send + Sync {
    /// Request a call to `to` that starts at the `voice_url` webhook
    async fn request_call(&self, to: &str, voice_url: &str) -> Result<()>;
}

/// Publishes call requests to NATS for the transport bridge
pub struct NatsCallRequester {
    client: NatsClient,
    subject: String,
}

impl NatsCallRequester {
    pub fn new(client: NatsClient, subject: String) -> Self {
        Self { client, subject }
    }
}

#[async_trait::async_trait]
impl CallRequester for NatsCallRequester {
    async fn request_call(&self, to: &str, voice_url: &str) -> Result<()> {
        let message = OutboundCallMessage {
            to: to.to_string(),
            voice_url: voice_url.to_string(),
            requested_at: Utc::now().to_rfc3339(),
            reason: "sms-callback".to_string(),
        };

        self.client.publish_json(&self.subject, &message).await
    }
}
