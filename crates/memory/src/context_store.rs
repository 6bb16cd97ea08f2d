//! In-memory conversation context store.
//!
//! Maps a session handle to a bounded, time-stamped history. The store owns
//! every [`ConversationContext`]; callers only ever get clones back, so no
//! one holds a reference across an await while the sweeper evicts entries.

use chatrelay_core::error::ContextError;
use chatrelay_core::message::{ConversationContext, HistoryEntry, SessionHandle};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default number of history entries kept per session.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Default inactivity threshold before a session is swept.
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(3600);

/// Process-wide store of per-session contexts.
///
/// All mutation goes through a single `RwLock`, which serializes appends
/// both within and across sessions.
pub struct ConversationContextStore {
    sessions: RwLock<HashMap<SessionHandle, ConversationContext>>,
    max_entries: usize,
    max_idle: chrono::Duration,
}

impl ConversationContextStore {
    /// A store with the default cap (10) and idle threshold (1 hour).
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_entries: DEFAULT_MAX_ENTRIES,
            max_idle: chrono::Duration::seconds(DEFAULT_MAX_IDLE.as_secs() as i64),
        }
    }

    /// A store with a custom cap and idle threshold.
    pub fn with_limits(max_entries: usize, max_idle: Duration) -> Result<Self, ContextError> {
        if max_entries == 0 {
            return Err(ContextError::InvalidCapacity(max_entries));
        }
        let max_idle = chrono::Duration::from_std(max_idle)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_MAX_IDLE.as_secs() as i64));
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            max_entries,
            max_idle,
        })
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Snapshot of a session's context, or an empty one if it has none yet.
    pub async fn get(&self, session: &SessionHandle) -> ConversationContext {
        self.sessions
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the session currently has a context.
    pub async fn contains(&self, session: &SessionHandle) -> bool {
        self.sessions.read().await.contains_key(session)
    }

    /// Append an entry, creating the context if needed.
    ///
    /// Keeps only the newest `max_entries` entries and returns the
    /// post-append snapshot.
    pub async fn append(
        &self,
        session: &SessionHandle,
        entry: HistoryEntry,
    ) -> ConversationContext {
        let mut sessions = self.sessions.write().await;
        let context = sessions.entry(session.clone()).or_insert_with(|| ConversationContext {
            history: Vec::new(),
            last_activity: entry.timestamp,
        });
        Self::push_bounded(context, entry, self.max_entries);
        context.clone()
    }

    /// Append only if the session still exists. Returns whether it did.
    ///
    /// Used for assistant replies, which finish after a delay; a session that
    /// ended meanwhile must not be brought back.
    pub async fn append_if_present(&self, session: &SessionHandle, entry: HistoryEntry) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session) {
            Some(context) => {
                Self::push_bounded(context, entry, self.max_entries);
                true
            }
            None => false,
        }
    }

    fn push_bounded(context: &mut ConversationContext, entry: HistoryEntry, cap: usize) {
        if entry.timestamp > context.last_activity {
            context.last_activity = entry.timestamp;
        }
        context.history.push(entry);
        if context.history.len() > cap {
            let excess = context.history.len() - cap;
            context.history.drain(..excess);
        }
    }

    /// Drop a session's context (session ended). Returns whether it existed.
    pub async fn remove(&self, session: &SessionHandle) -> bool {
        self.sessions.write().await.remove(session).is_some()
    }

    /// Remove every session idle for longer than the threshold as of `now`.
    /// Returns how many were removed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.max_idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, ctx| ctx.last_activity >= cutoff);
        before - sessions.len()
    }

    /// Number of sessions with a context.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for ConversationContextStore {
    fn default() -> Self {
        Self::new()
    }
}
