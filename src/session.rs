use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub original: String,
    pub translated: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// Ordered translations of one UI session. Grows without bound and never de-duplicates.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, original: &str, translated: &str, language: &str) {
        self.entries.push(HistoryEntry {
            original: original.to_string(),
            translated: translated.to_string(),
            language: language.to_string(),
            created_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move every entry of `other` onto the end of this history.
    pub fn append(&mut self, other: SessionHistory) {
        self.entries.extend(other.entries);
    }
}

/// Volatile state of one browser session.
#[derive(Debug, Clone)]
pub struct UiSession {
    pub id: String,
    pub history: SessionHistory,
    /// Last successful `(translation, language)`, target of copy and playback.
    pub last_translation: Option<(String, String)>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl UiSession {
    fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: SessionHistory::new(),
            last_translation: None,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// Shared handle to one session. Lock it only for reads and updates, never
/// across a backend call.
pub type SessionHandle = Arc<Mutex<UiSession>>;

/// All live UI sessions keyed by their cookie id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_session_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Look up the session for `id`, creating one under a fresh id when `id` is absent or unknown.
    pub fn get_or_create(&self, id: Option<&str>) -> (String, SessionHandle) {
        if let Some(id) = id {
            if let Some(handle) = self.sessions.get(id) {
                return (id.to_string(), handle.value().clone());
            }
        }

        let id = self.generate_session_id();
        debug!("Created UI session {}", id);
        let handle = Arc::new(Mutex::new(UiSession::new(id.clone())));
        self.sessions.insert(id.clone(), handle.clone());
        (id, handle)
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|h| h.value().clone())
    }

    pub async fn snapshot(&self, id: &str) -> Option<UiSession> {
        let handle = self.sessions.get(id).map(|h| h.value().clone())?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Drop a session and with it its history.
    pub fn end_session(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            debug!("Ended UI session {}", id);
        }
        removed
    }

    /// Remove sessions idle for longer than `max_idle`; returns how many were removed.
    /// Sessions busy with a request are never idle.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.last_seen >= cutoff,
            Err(_) => true,
        });
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
