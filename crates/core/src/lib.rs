//! # chatrelay core
//!
//! Domain types, traits, and error definitions for the chatrelay responder.
//! This crate has **no framework dependencies**; it defines the domain model
//! that all other crates implement against.
//!
//! Every seam is a trait here ([`Provider`], [`Transport`], [`RandomSource`]),
//! so the orchestration logic can be tested with fakes and no network.

pub mod error;
pub mod message;
pub mod provider;
pub mod random;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use error::{ContextError, ProviderError, TransportError};
pub use message::{
    ChatEvent, ChatLine, ConversationContext, HistoryEntry, InboundMessage, Role, SessionHandle,
};
pub use provider::{GenerateRequest, Provider};
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use transport::Transport;
