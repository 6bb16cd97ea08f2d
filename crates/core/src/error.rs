//! Error types for the chatrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

/// Failure of a single generation backend.
///
/// The fallback chain treats every variant the same way: log it and move on
/// to the next provider. The variants exist so logs say what went wrong.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("History cap must be at least 1, got {0}")]
    InvalidCapacity(usize),
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Nobody was connected to receive the event.
    #[error("No connected participants")]
    NoListeners,
}
