//! Provider trait — the abstraction over text-generation backends.
//!
//! A Provider takes the current message, who sent it and the recent
//! conversation, and returns reply text or a [`ProviderError`].
//!
//! Implementations: OpenAI chat completions, Google Gemini, Hugging Face
//! inference. Tests inject their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::HistoryEntry;

/// Everything a provider gets to see for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The message to answer (command prefix already stripped)
    pub text: String,

    /// Display name of the person being answered
    pub sender: String,

    /// Earlier turns of this session, oldest first, excluding `text`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

impl GenerateRequest {
    pub fn new(text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: sender.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }
}

/// The core Provider trait.
///
/// Adapters never retry. Any transport failure, bad status, malformed or
/// empty payload is returned as a `ProviderError`; the fallback chain decides
/// what happens next.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Whether the provider's credential is present.
    fn is_available(&self) -> bool {
        true
    }

    /// Generate a reply.
    async fn generate(&self, request: GenerateRequest) -> std::result::Result<String, ProviderError>;
}
