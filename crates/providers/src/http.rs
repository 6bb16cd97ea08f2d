//! HTTP plumbing shared by the network-bound adapters.

use chatrelay_core::error::ProviderError;
use std::time::Duration;
use tracing::warn;

/// Build a client with a hard request timeout.
pub(crate) fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to a default HTTP client");
            reqwest::Client::new()
        })
}

/// Classify a failed `send()`.
///
/// The URL is stripped first; some providers put credentials in it.
pub(crate) fn send_error(provider: &str, e: reqwest::Error) -> ProviderError {
    let e = e.without_url();
    if e.is_timeout() {
        ProviderError::Timeout(format!("{provider}: {e}"))
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// A body that did not match the expected shape.
pub(crate) fn decode_error(e: reqwest::Error) -> ProviderError {
    ProviderError::MalformedResponse(format!("Failed to parse response: {}", e.without_url()))
}

/// Turn a non-2xx response into the matching error.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if (200..300).contains(&status) {
        return Ok(response);
    }

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    let error_body = response.text().await.unwrap_or_default();
    warn!(provider, status, body = %error_body, "Provider returned error");
    Err(ProviderError::ApiError {
        status_code: status,
        message: error_body,
    })
}

/// Reject blank generations.
pub(crate) fn non_empty(provider: &str, text: &str) -> Result<String, ProviderError> {
    let text = text.trim();
    if text.is_empty() {
        Err(ProviderError::EmptyResponse(provider.to_string()))
    } else {
        Ok(text.to_string())
    }
}
