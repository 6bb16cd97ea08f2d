//! Provider fallback: an ordered chain with per-provider timeouts.
//!
//! Providers are tried strictly in order. The first non-empty reply wins and
//! later providers are never contacted. Providers that report themselves
//! unavailable are skipped without a call.

use chatrelay_core::error::ProviderError;
use chatrelay_core::provider::{GenerateRequest, Provider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-provider timeout when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A successful generation and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReply {
    pub provider: String,
    pub text: String,
}

/// One provider in the chain and how long it may take.
struct FallbackEntry {
    provider: Arc<dyn Provider>,
    timeout: Duration,
}

/// Ordered list of generation backends.
#[derive(Default)]
pub struct FallbackChain {
    chain: Vec<FallbackEntry>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider with a custom timeout.
    pub fn add(mut self, provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { provider, timeout });
        self
    }

    /// Append a provider with [`DEFAULT_TIMEOUT`].
    pub fn add_default(self, provider: Arc<dyn Provider>) -> Self {
        self.add(provider, DEFAULT_TIMEOUT)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// `(name, available)` for every provider, in chain order.
    pub fn availability(&self) -> Vec<(String, bool)> {
        self.chain
            .iter()
            .map(|e| (e.provider.name().to_string(), e.provider.is_available()))
            .collect()
    }

    /// Whether at least one provider could be called.
    pub fn any_available(&self) -> bool {
        self.chain.iter().any(|e| e.provider.is_available())
    }

    /// Ask each available provider in turn until one answers.
    ///
    /// Returns the last provider error when every attempt failed, or
    /// `NotConfigured` when no provider was available to try.
    pub async fn generate(&self, request: GenerateRequest) -> Result<ChainReply, ProviderError> {
        let mut last_error = ProviderError::NotConfigured("No providers available in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let provider_name = entry.provider.name().to_string();

            if !entry.provider.is_available() {
                debug!(provider = %provider_name, "Fallback: provider unavailable, skipping");
                continue;
            }

            info!(
                provider = %provider_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Fallback: trying provider"
            );

            match tokio::time::timeout(entry.timeout, entry.provider.generate(request.clone())).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    return Ok(ChainReply {
                        provider: provider_name,
                        text,
                    });
                }
                Ok(Ok(_)) => {
                    warn!(provider = %provider_name, "Fallback: provider returned empty text, trying next");
                    last_error = ProviderError::EmptyResponse(provider_name);
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = %provider_name,
                        error = %e,
                        "Fallback: provider failed, trying next"
                    );
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        provider = %provider_name,
                        timeout_ms = entry.timeout.as_millis() as u64,
                        "Fallback: provider timed out, trying next"
                    );
                    last_error = ProviderError::Timeout(format!(
                        "Provider '{}' timed out after {}ms",
                        provider_name,
                        entry.timeout.as_millis()
                    ));
                }
            }
        }

        Err(last_error)
    }
}
