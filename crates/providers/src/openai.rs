//! OpenAI chat-completions provider.
//!
//! Sends the persona as the system message, the session's earlier turns as
//! user/assistant messages, then the current message. Works against any
//! endpoint exposing a compatible `/chat/completions`.

use async_trait::async_trait;
use chatrelay_config::ProviderConfig;
use chatrelay_core::error::ProviderError;
use chatrelay_core::message::Role;
use chatrelay_core::provider::{GenerateRequest, Provider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::http;
use crate::prompt;

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;
const PRESENCE_PENALTY: f32 = 0.1;
const FREQUENCY_PENALTY: f32 = 0.1;

/// An OpenAI-compatible chat provider.
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    assistant_name: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider from its config section.
    pub fn new(config: &ProviderConfig, assistant_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.credential().map(String::from),
            model: config.model.clone(),
            assistant_name: assistant_name.into(),
            client: http::client(timeout),
        }
    }

    /// Build the chat message list for a request.
    fn to_api_messages(&self, request: &GenerateRequest) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ApiMessage {
            role: "system".into(),
            content: Some(prompt::persona(&self.assistant_name, &request.sender)),
        });
        messages.extend(request.history.iter().map(|entry| ApiMessage {
            role: match entry.role {
                Role::User => "user".into(),
                Role::Assistant => "assistant".into(),
            },
            content: Some(entry.text.clone()),
        }));
        messages.push(ApiMessage {
            role: "user".into(),
            content: Some(request.text.clone()),
        });
        messages
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: GenerateRequest) -> std::result::Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": self.to_api_messages(&request),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "presence_penalty": PRESENCE_PENALTY,
            "frequency_penalty": FREQUENCY_PENALTY,
        });

        debug!(provider = "openai", model = %self.model, history = request.history.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error("openai", e))?;

        let response = http::check_status("openai", response).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(http::decode_error)?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        http::non_empty("openai", &choice.message.content.unwrap_or_default())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
