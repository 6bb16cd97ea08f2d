//! Transport trait — the abstraction over whatever delivers chat events.
//!
//! The responder never talks to sockets. It hands [`ChatEvent`]s to a
//! Transport, which fans them out to participants (the gateway's WebSocket
//! hub in production, a recording vector in tests).

use async_trait::async_trait;
use crate::error::TransportError;
use crate::message::ChatEvent;

/// The core Transport trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver an event to every connected participant.
    async fn broadcast(&self, event: ChatEvent) -> std::result::Result<(), TransportError>;
}
