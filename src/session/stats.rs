use serde::{Deserialize, Serialize};

/// Snapshot of the session store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Sessions currently held in memory
    pub active_sessions: usize,

    /// Sessions past the PIN prompt
    pub verified_sessions: usize,

    /// Saved answers not yet written to the journal
    pub answers_in_flight: usize,

    /// Recordings waiting on a save/re-record/review choice
    pub pending_recordings: usize,
}
