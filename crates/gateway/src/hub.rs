//! Fan-out of chat events to connected sockets.
//!
//! One `tokio::sync::broadcast` channel carries addressed envelopes; each
//! connection subscribes and forwards only what is meant for it.

use std::sync::Arc;

use async_trait::async_trait;
use chatrelay_core::error::TransportError;
use chatrelay_core::message::{ChatEvent, SessionHandle};
use chatrelay_core::transport::Transport;
use tokio::sync::broadcast;

/// Who an event is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    All,
    AllExcept(SessionHandle),
    Only(SessionHandle),
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub audience: Audience,
    pub event: ChatEvent,
}

impl Envelope {
    pub fn is_for(&self, connection: &SessionHandle) -> bool {
        match &self.audience {
            Audience::All => true,
            Audience::AllExcept(excluded) => excluded != connection,
            Audience::Only(target) => target == connection,
        }
    }
}

pub struct Hub {
    sender: broadcast::Sender<Arc<Envelope>>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Address `event` to `audience`. Returns how many connections were listening.
    pub fn send(&self, audience: Audience, event: ChatEvent) -> usize {
        // No subscribers just means nobody is connected.
        self.sender
            .send(Arc::new(Envelope { audience, event }))
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Envelope>> {
        self.sender.subscribe()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Transport for Hub {
    async fn broadcast(&self, event: ChatEvent) -> Result<(), TransportError> {
        match self.send(Audience::All, event) {
            0 => Err(TransportError::NoListeners),
            _ => Ok(()),
        }
    }
}
