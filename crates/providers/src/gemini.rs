//! Google Gemini provider.
//!
//! Gemini gets one prompt string: persona, recent transcript and the user's
//! message, sent to `models/{model}:generateContent`. The key travels in the
//! `x-goog-api-key` header so it never appears in a URL.

use async_trait::async_trait;
use chatrelay_config::ProviderConfig;
use chatrelay_core::error::ProviderError;
use chatrelay_core::provider::{GenerateRequest, Provider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::http;
use crate::prompt;

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    assistant_name: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig, assistant_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.credential().map(String::from),
            model: config.model.clone(),
            assistant_name: assistant_name.into(),
            client: http::client(timeout),
        }
    }

    fn build_request(&self, request: &GenerateRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart {
                    text: Some(prompt::single_turn(
                        &self.assistant_name,
                        &request.sender,
                        &request.history,
                        &request.text,
                    )),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 150,
                temperature: 0.7,
            },
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: GeminiResponse) -> Result<String, ProviderError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No candidates in response".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        http::non_empty("gemini", &text)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: GenerateRequest) -> std::result::Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("GEMINI_API_KEY is not set".into()))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(provider = "gemini", model = %self.model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(&request))
            .send()
            .await
            .map_err(|e| http::send_error("gemini", e))?;

        let response = http::check_status("gemini", response).await?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(http::decode_error)?;

        Self::extract_text(parsed)
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}
