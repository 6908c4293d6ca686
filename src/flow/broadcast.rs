use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// The pastor's message played to callers before their questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Broadcast {
    pub recording_url: String,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: String,
}

/// Holds the latest broadcast (in memory, replaced on every save)
#[derive(Clone, Default)]
pub struct BroadcastBoard {
    current: Arc<RwLock<Option<Broadcast>>>,
}

impl BroadcastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Broadcast> {
        self.current.read().await.clone()
    }

    pub async fn publish(&self, broadcast: Broadcast) {
        info!(
            "New broadcast from {}: {}",
            broadcast.recorded_by, broadcast.recording_url
        );
        *self.current.write().await = Some(broadcast);
    }
}
