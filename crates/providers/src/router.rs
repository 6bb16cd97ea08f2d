//! Builds the provider chain from configuration.
//!
//! The order is fixed: OpenAI first, then Gemini, then Hugging Face. A
//! provider without a credential stays in the chain but reports itself
//! unavailable, so `chatrelay providers` can still list it.

use std::sync::Arc;

use chatrelay_config::AppConfig;
use tracing::info;

use crate::fallback::FallbackChain;
use crate::gemini::GeminiProvider;
use crate::huggingface::HuggingFaceProvider;
use crate::openai::OpenAiProvider;

/// Build the fallback chain described by `config`.
pub fn build_from_config(config: &AppConfig) -> FallbackChain {
    let timeout = config.providers.timeout();
    let name = config.assistant.name.as_str();

    let chain = FallbackChain::new()
        .add(
            Arc::new(OpenAiProvider::new(&config.providers.openai, name, timeout)),
            timeout,
        )
        .add(
            Arc::new(GeminiProvider::new(&config.providers.gemini, name, timeout)),
            timeout,
        )
        .add(
            Arc::new(HuggingFaceProvider::new(&config.providers.huggingface, timeout)),
            timeout,
        );

    let available: Vec<String> = chain
        .availability()
        .into_iter()
        .filter(|(_, up)| *up)
        .map(|(name, _)| name)
        .collect();

    if available.is_empty() {
        info!("No provider credentials configured, replies will come from the local responder");
    } else {
        info!(providers = ?available, "Provider chain ready");
    }

    chain
}
