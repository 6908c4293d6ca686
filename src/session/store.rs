use super::session::Session;
use super::stats::StoreStats;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// In-memory session store keyed by caller id
///
/// The map lock is only held for lookups and inserts; each session has its
/// own mutex that webhook handlers hold while they mutate it.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Existing session for the caller, or a fresh one awaiting the PIN
    pub async fn get_or_create(&self, caller_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.get(caller_id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(caller_id.to_string()).or_insert_with(|| {
            debug!("Creating session for caller {}", caller_id);
            Arc::new(Mutex::new(Session::new(caller_id)))
        }))
    }

    /// Look up the caller's session and mark it active.
    ///
    /// The touch happens under the map read lock, so the sweeper (which needs
    /// the write lock) cannot evict it between lookup and use. A session that
    /// is already locked is in use and is skipped by the sweeper anyway.
    pub async fn get(&self, caller_id: &str) -> Option<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(caller_id)?;
        if let Ok(mut guard) = session.try_lock() {
            guard.touch();
        }
        Some(Arc::clone(session))
    }

    /// Delete the caller's session, provided `session` is still the one
    /// stored (a newer call may have replaced it meanwhile).
    /// Returns whether anything was removed.
    pub async fn delete(&self, caller_id: &str, session: &Arc<Mutex<Session>>) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(caller_id)
            .is_some_and(|stored| Arc::ptr_eq(stored, session))
        {
            sessions.remove(caller_id);
            debug!("Deleted session for caller {}", caller_id);
            true
        } else {
            false
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Remove sessions idle for longer than the timeout as of `now`.
    /// Sessions locked by an in-flight webhook are left alone.
    pub async fn evict_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|caller_id, session| match session.try_lock() {
            Ok(guard) => {
                let idle = now.saturating_duration_since(guard.last_seen);
                if idle > self.idle_timeout {
                    info!(
                        "Evicting idle session for caller {} ({} idle for {}s)",
                        caller_id,
                        guard.state.name(),
                        idle.as_secs()
                    );
                    false
                } else {
                    true
                }
            }
            Err(_) => true,
        });

        before - sessions.len()
    }

    /// Spawn a task that evicts idle sessions every `interval`
    pub fn spawn_eviction(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();

        tokio::spawn(async move {
            info!(
                "Session eviction task started (idle timeout {}s, every {}s)",
                store.idle_timeout.as_secs(),
                interval.as_secs()
            );

            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle_at(Instant::now()).await;
                if evicted > 0 {
                    info!("Evicted {} idle session(s)", evicted);
                }
            }
        })
    }

    pub async fn stats(&self) -> StoreStats {
        let sessions: Vec<Arc<Mutex<Session>>> =
            self.sessions.read().await.values().cloned().collect();

        let mut stats = StoreStats {
            active_sessions: sessions.len(),
            ..StoreStats::default()
        };
        for session in sessions {
            let session = session.lock().await;
            if session.pin_verified() {
                stats.verified_sessions += 1;
            }
            stats.answers_in_flight += session.answers.len();
            if session.pending_recording().is_some() {
                stats.pending_recordings += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CallState, Recording};

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let store = SessionStore::new(Duration::from_secs(60));

        let first = store.get_or_create("+15550001111").await;
        first.lock().await.state = CallState::AskingQuestion { index: 1 };

        let second = store.get_or_create("+15550001111").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_callers_are_independent() {
        let store = SessionStore::new(Duration::from_secs(60));

        let a = store.get_or_create("+15550001111").await;
        let _guard = a.lock().await;

        // Another caller is not blocked by a held session lock
        let b = store.get_or_create("+15550002222").await;
        assert!(b.try_lock().is_ok());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_delete_only_removes_same_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let old = store.get_or_create("+15550001111").await;
        assert!(store.delete("+15550001111", &old).await);
        assert!(store.is_empty().await);

        let newer = store.get_or_create("+15550001111").await;
        assert!(!store.delete("+15550001111", &old).await);

        let stored = store.get("+15550001111").await.unwrap();
        assert!(Arc::ptr_eq(&stored, &newer));
    }

    #[tokio::test]
    async fn test_lookup_keeps_session_from_eviction() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.get_or_create("+15550001111").await;
        let Some(long_ago) = Instant::now().checked_sub(Duration::from_secs(120)) else {
            return;
        };
        session.lock().await.last_seen = long_ago;

        // A webhook has looked the session up but not locked it yet
        let looked_up = store.get("+15550001111").await.unwrap();
        let evicted = store.evict_idle_at(Instant::now()).await;

        assert_eq!(evicted, 0);
        let stored = store.get("+15550001111").await.unwrap();
        assert!(Arc::ptr_eq(&stored, &looked_up));
    }

    #[tokio::test]
    async fn test_stats_count_pending_recordings() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.get_or_create("+15550001111").await;
        session.lock().await.state = CallState::AwaitingMenuChoice {
            index: 0,
            pending: Recording {
                url: "https://rec/a".to_string(),
                transcript: None,
            },
            reprompts: 0,
        };
        store.get_or_create("+15550002222").await;

        let stats = store.stats().await;

        assert_eq!(stats.active_sessions, 2);
        assert_eq!(stats.verified_sessions, 1);
        assert_eq!(stats.pending_recordings, 1);
    }

    #[tokio::test]
    async fn test_evicts_only_idle_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.get_or_create("+15550001111").await;
        let fresh = store.get_or_create("+15550002222").await;

        let later = Instant::now() + Duration::from_secs(120);
        fresh.lock().await.last_seen = later;

        let evicted = store.evict_idle_at(later).await;

        assert_eq!(evicted, 1);
        assert!(store.get("+15550001111").await.is_none());
        assert!(store.get("+15550002222").await.is_some());
    }

    #[tokio::test]
    async fn test_locked_session_is_not_evicted() {
        let store = SessionStore::new(Duration::from_secs(1));
        let session = store.get_or_create("+15550001111").await;
        let _guard = session.lock().await;

        let evicted = store
            .evict_idle_at(Instant::now() + Duration::from_secs(10))
            .await;

        assert_eq!(evicted, 0);
        assert_eq!(store.len().await, 1);
    }
}
