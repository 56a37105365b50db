use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::{Duration as StdDuration, Instant};

use chrono::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::models::Session;

/// In-memory session map keyed by sender phone number. Each session sits
/// behind its own mutex; the flow engine holds that mutex for the whole
/// handling of one message, so two messages from the same sender can never
/// interleave while different senders proceed in parallel.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the sender's session, creating a fresh menu session when
    /// none exists.
    pub async fn get_or_create(&self, key: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!("New session for {}", key);
                Arc::new(Mutex::new(Session::new()))
            })
            .clone()
    }

    /// Non-mutating lookup: no entry is created and the activity stamp is
    /// left alone. Absence just means "needs creation".
    pub async fn get(&self, key: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(key).cloned()
    }

    pub async fn remove(&self, key: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(key).is_some() {
            debug!("Session removed for {}", key);
        }
    }

    /// Drops sessions idle for longer than `timeout`. A session whose mutex
    /// is currently held is mid-message and therefore not idle; it is
    /// skipped rather than waited on.
    pub async fn sweep_expired(&self, timeout: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => !guard.is_expired(timeout),
            Err(_) => true,
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Swept {} expired session(s)", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// WhatsApp redelivers webhooks it considers unacknowledged, so every
/// message id is remembered for a short window and repeats are dropped
/// before they reach the flow engine.
pub struct DedupGuard {
    ttl: StdDuration,
    seen: StdMutex<HashMap<String, Instant>>,
}

impl DedupGuard {
    pub const DEFAULT_TTL: StdDuration = StdDuration::from_secs(5 * 60);

    pub fn new(ttl: StdDuration) -> Self {
        Self {
            ttl,
            seen: StdMutex::new(HashMap::new()),
        }
    }

    /// True exactly once per message id within the TTL window.
    pub fn should_process(&self, message_id: &str) -> bool {
        let mut seen = self.seen.lock().unwrap();
        let now = Instant::now();

        if let Some(first_seen) = seen.get(message_id) {
            if now.duration_since(*first_seen) < self.ttl {
                info!("Duplicate message {} ignored", message_id);
                return false;
            }
        }

        seen.insert(message_id.to_string(), now);
        true
    }

    /// Drops entries older than the TTL.
    pub fn sweep(&self) -> usize {
        let mut seen = self.seen.lock().unwrap();
        let before = seen.len();
        let now = Instant::now();
        seen.retain(|_, first_seen| now.duration_since(*first_seen) < self.ttl);
        before - seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DedupGuard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}
