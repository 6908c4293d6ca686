use crate::flow::CallFlow;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Journaling call flow (owns the session store)
    pub flow: Arc<CallFlow>,

    /// Service name reported by the status endpoint
    pub service_name: String,
}

impl AppState {
    pub fn new(flow: CallFlow, service_name: impl Into<String>) -> Self {
        Self {
            flow: Arc::new(flow),
            service_name: service_name.into(),
        }
    }
}
