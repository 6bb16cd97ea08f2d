//! Configuration loading, validation, and management for chatrelay.
//!
//! Loads configuration from `$CHATRELAY_CONFIG` (or `./chatrelay.toml`) with
//! environment variable overrides. Validates all settings at startup.
//!
//! Provider availability is decided by credential presence alone: an empty
//! or missing `api_key` means the provider is skipped.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// The automated participant
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Per-session context store
    #[serde(default)]
    pub context: ContextConfig,

    /// Generation backends
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// HTTP / WebSocket gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Display name used on every assistant message
    #[serde(default = "default_assistant_name")]
    pub name: String,

    /// Chance of answering a message nobody addressed to the assistant
    #[serde(default = "default_idle_chatter_probability")]
    pub idle_chatter_probability: f64,

    /// Delay before the assistant greets a newly joined user
    #[serde(default = "default_welcome_delay_ms")]
    pub welcome_delay_ms: u64,

    #[serde(default)]
    pub typing: TypingConfig,
}

fn default_assistant_name() -> String {
    "ChatBot AI".into()
}
fn default_idle_chatter_probability() -> f64 {
    0.05
}
fn default_welcome_delay_ms() -> u64 {
    2000
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            idle_chatter_probability: default_idle_chatter_probability(),
            welcome_delay_ms: default_welcome_delay_ms(),
            typing: TypingConfig::default(),
        }
    }
}

impl AssistantConfig {
    pub fn welcome_delay(&self) -> Duration {
        Duration::from_millis(self.welcome_delay_ms)
    }
}

/// Artificial delays that make the assistant look like it is typing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Before the typing indicator appears
    #[serde(default = "default_pre_delay_ms")]
    pub pre_delay_ms: u64,

    /// Lower bound of the randomized delay before the reply is sent
    #[serde(default = "default_min_post_delay_ms")]
    pub min_post_delay_ms: u64,

    /// Upper bound of the randomized delay before the reply is sent
    #[serde(default = "default_max_post_delay_ms")]
    pub max_post_delay_ms: u64,
}

fn default_pre_delay_ms() -> u64 {
    500
}
fn default_min_post_delay_ms() -> u64 {
    1500
}
fn default_max_post_delay_ms() -> u64 {
    3000
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            pre_delay_ms: default_pre_delay_ms(),
            min_post_delay_ms: default_min_post_delay_ms(),
            max_post_delay_ms: default_max_post_delay_ms(),
        }
    }
}

impl TypingConfig {
    /// Zero delays, for tests and one-shot CLI use.
    pub fn instant() -> Self {
        Self {
            pre_delay_ms: 0,
            min_post_delay_ms: 0,
            max_post_delay_ms: 0,
        }
    }

    pub fn pre_delay(&self) -> Duration {
        Duration::from_millis(self.pre_delay_ms)
    }

    /// Post-typing delay for a uniform draw `unit` in `[0, 1)`.
    pub fn post_delay(&self, unit: f64) -> Duration {
        let span = self.max_post_delay_ms.saturating_sub(self.min_post_delay_ms) as f64;
        Duration::from_millis(self.min_post_delay_ms + (span * unit.clamp(0.0, 1.0)) as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// History entries kept per session
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// How often stale sessions are swept
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Inactivity after which a session's context is dropped
    #[serde(default = "default_max_idle_secs")]
    pub max_idle_secs: u64,
}

fn default_max_entries() -> usize {
    10
}
fn default_sweep_interval_secs() -> u64 {
    3600
}
fn default_max_idle_secs() -> u64 {
    3600
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_idle_secs: default_max_idle_secs(),
        }
    }
}

impl ContextConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.max_idle_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Bounded wait for a single provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_openai")]
    pub openai: ProviderConfig,

    #[serde(default = "default_gemini")]
    pub gemini: ProviderConfig,

    #[serde(default = "default_huggingface")]
    pub huggingface: ProviderConfig,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_openai() -> ProviderConfig {
    ProviderConfig::new("https://api.openai.com/v1", "gpt-3.5-turbo")
}
fn default_gemini() -> ProviderConfig {
    ProviderConfig::new(
        "https://generativelanguage.googleapis.com/v1beta",
        "gemini-1.5-flash",
    )
}
fn default_huggingface() -> ProviderConfig {
    ProviderConfig::new(
        "https://api-inference.huggingface.co",
        "microsoft/DialoGPT-medium",
    )
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            openai: default_openai(),
            gemini: default_gemini(),
            huggingface: default_huggingface(),
        }
    }
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub api_url: String,

    pub model: String,
}

impl ProviderConfig {
    fn new(api_url: &str, model: &str) -> Self {
        Self {
            api_key: None,
            api_url: api_url.into(),
            model: model.into(),
        }
    }

    /// The credential, if one is set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$CHATRELAY_CONFIG` or `./chatrelay.toml`.
    ///
    /// Environment variables override the file:
    /// - `OPENAI_API_KEY`, `GEMINI_API_KEY`, `HUGGINGFACE_API_KEY`
    /// - `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The config file location.
    pub fn config_path() -> PathBuf {
        std::env::var("CHATRELAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("chatrelay.toml"))
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a closure so tests don't have to mutate the
    /// process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.providers.openai.api_key = Some(key);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.providers.gemini.api_key = Some(key);
        }
        if let Some(key) = lookup("HUGGINGFACE_API_KEY") {
            self.providers.huggingface.api_key = Some(key);
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring unparseable PORT"),
            }
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let p = self.assistant.idle_chatter_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::ValidationError(
                "assistant.idle_chatter_probability must be between 0.0 and 1.0".into(),
            ));
        }

        let typing = &self.assistant.typing;
        if typing.min_post_delay_ms > typing.max_post_delay_ms {
            return Err(ConfigError::ValidationError(
                "assistant.typing.min_post_delay_ms must not exceed max_post_delay_ms".into(),
            ));
        }

        if self.context.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_entries must be > 0".into(),
            ));
        }

        if self.providers.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "providers.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
