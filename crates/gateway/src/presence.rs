//! Who is online.

use std::collections::HashMap;

use chatrelay_core::message::SessionHandle;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub username: String,
    pub joined_at: DateTime<Utc>,
}

/// Joined connections, keyed by connection. The online count is the number
/// of entries, so it can never go negative.
#[derive(Default)]
pub struct Presence {
    participants: RwLock<HashMap<SessionHandle, Participant>>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `username` on `connection` and return the online count.
    ///
    /// Joining twice on one connection renames rather than double-counting.
    pub async fn join(&self, connection: &SessionHandle, username: impl Into<String>) -> usize {
        let mut participants = self.participants.write().await;
        participants.insert(
            connection.clone(),
            Participant {
                username: username.into(),
                joined_at: Utc::now(),
            },
        );
        participants.len()
    }

    /// Unregister `connection`. `None` if it never joined.
    pub async fn leave(&self, connection: &SessionHandle) -> Option<(Participant, usize)> {
        let mut participants = self.participants.write().await;
        let participant = participants.remove(connection)?;
        Some((participant, participants.len()))
    }

    pub async fn username(&self, connection: &SessionHandle) -> Option<String> {
        self.participants
            .read()
            .await
            .get(connection)
            .map(|p| p.username.clone())
    }

    pub async fn online(&self) -> usize {
        self.participants.read().await.len()
    }
}
