//! Message, history and outbound event types.
//!
//! These are the value objects that flow through the responder:
//! transport receives an [`InboundMessage`] → coordinator records a
//! [`HistoryEntry`] → orchestrator produces text → transport delivers a
//! [`ChatEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for one connected participant's transport connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub String);

impl SessionHandle {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A chat message handed to the responder by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The text as typed (already trimmed by the transport)
    pub text: String,

    /// Display name of the sender
    pub sender: String,

    /// The connection the message arrived on
    pub session: SessionHandle,

    /// When the transport received it
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(
        text: impl Into<String>,
        sender: impl Into<String>,
        session: impl Into<SessionHandle>,
    ) -> Self {
        Self {
            text: text.into(),
            sender: sender.into(),
            session: session.into(),
            received_at: Utc::now(),
        }
    }
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human participant
    User,
    /// The automated participant
    Assistant,
}

/// One turn of a conversation, as remembered by the context store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,

    pub text: String,

    /// Present only for `Role::User`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// A user turn stamped with the current time.
    pub fn user(text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sender: Some(sender.into()),
            timestamp: Utc::now(),
        }
    }

    /// An assistant turn stamped with the current time.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            sender: None,
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Bounded recent history for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Oldest first
    pub history: Vec<HistoryEntry>,

    /// Timestamp of the most recent append
    pub last_activity: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A chat line as delivered to every participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub sender: String,

    pub text: String,

    /// RFC 3339 on the wire
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub is_assistant: bool,

    #[serde(default)]
    pub is_system: bool,
}

impl ChatLine {
    pub fn user(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp: Utc::now(),
            is_assistant: false,
            is_system: false,
        }
    }

    pub fn assistant(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_assistant: true,
            ..Self::user(sender, text)
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            is_system: true,
            ..Self::user("System", text)
        }
    }
}

/// Events pushed from the server to chat clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A chat line
    Message(ChatLine),

    /// Someone (possibly the assistant) started typing
    Typing { username: String },

    /// Typing indicator cleared
    StopTyping,

    UserJoined { username: String, online_users: usize },

    UserLeft { username: String, online_users: usize },

    /// Sent to a freshly joined client
    OnlineUsers { count: usize },
}
