//! Hugging Face inference provider (free tier, last in the chain).
//!
//! Talks to a conversational model such as `microsoft/DialoGPT-medium`. The
//! model has no system prompt, so only the user's text is sent.

use async_trait::async_trait;
use chatrelay_config::ProviderConfig;
use chatrelay_core::error::ProviderError;
use chatrelay_core::provider::{GenerateRequest, Provider};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::http;

/// Marker appended to every Hugging Face reply.
const REPLY_SUFFIX: &str = " 🤖";

pub struct HuggingFaceProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl HuggingFaceProvider {
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.credential().map(String::from),
            model: config.model.clone(),
            client: http::client(timeout),
        }
    }

    fn extract_text(response: HfResponse) -> Result<String, ProviderError> {
        let generated = match response {
            HfResponse::Single(output) => output.generated_text,
            HfResponse::Batch(outputs) => outputs.into_iter().next().and_then(|o| o.generated_text),
        };
        let text = generated
            .ok_or_else(|| ProviderError::MalformedResponse("No response from Hugging Face".into()))?;
        let text = http::non_empty("huggingface", &text)?;
        Ok(format!("{text}{REPLY_SUFFIX}"))
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: GenerateRequest) -> std::result::Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("HUGGINGFACE_API_KEY is not set".into()))?;

        let url = format!("{}/models/{}", self.base_url, self.model);
        let body = serde_json::json!({
            "inputs": {
                "past_user_inputs": [request.text],
                "generated_responses": [],
            }
        });

        debug!(provider = "huggingface", model = %self.model, "Sending inference request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error("huggingface", e))?;

        let response = http::check_status("huggingface", response).await?;

        let parsed: HfResponse = response
            .json()
            .await
            .map_err(http::decode_error)?;

        Self::extract_text(parsed)
    }
}

/// The inference API answers with either an object or a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfResponse {
    Single(HfOutput),
    Batch(Vec<HfOutput>),
}

#[derive(Debug, Deserialize)]
struct HfOutput {
    #[serde(default)]
    generated_text: Option<String>,
}
