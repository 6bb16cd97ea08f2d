//! Conversation memory for chatrelay.
//!
//! Process-lifetime only: contexts live in a map owned by
//! [`ConversationContextStore`] and are evicted by [`spawn_sweeper`].

pub mod context_store;
pub mod sweeper;

pub use context_store::{ConversationContextStore, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_IDLE};
pub use sweeper::spawn_sweeper;
