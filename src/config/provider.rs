//! Language-model provider selection and per-chat model configuration.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Sentinel the backend stores before a chat has been configured.
pub const PENDING: &str = "pending";

/// Sampling temperature used when none has been chosen.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Which backend-side provider serves a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// Groq-hosted models.
    Groq,
    /// Locally hosted models served by Ollama. No API key needed.
    Ollama,
    /// ChatGPT-style hosted models.
    ChatGpt,
}

impl Provider {
    /// The `model_type` value the backend expects on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ",
            Provider::Ollama => "Ollama",
            Provider::ChatGpt => "ChatGPT",
        }
    }

    /// The short name used for the provider tab / `provider` field.
    pub fn short_name(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Ollama => "ollama",
            Provider::ChatGpt => "gpt",
        }
    }

    /// Parse a backend `model_type` value, case-insensitively.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "groq" => Some(Provider::Groq),
            "ollama" => Some(Provider::Ollama),
            "chatgpt" | "gpt" => Some(Provider::ChatGpt),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::from_wire(s).ok_or_else(|| format!("unknown provider: {}", s))
    }
}

/// The model configuration attached to one chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: Provider,
    pub language_model: String,
    pub api_key: String,
    pub temperature: f64,
}

impl ModelConfig {
    /// A fresh, not-yet-configured chat as the backend creates it.
    pub fn pending(provider: Provider) -> Self {
        Self {
            provider,
            language_model: PENDING.to_string(),
            api_key: PENDING.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn new(provider: Provider, language_model: impl Into<String>) -> Self {
        Self {
            provider,
            language_model: language_model.into(),
            // Ollama chats are saved with an empty key, which counts as configured.
            api_key: String::new(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether messages may be submitted for this chat. The backend
    /// marks unconfigured chats with the `pending` sentinel in both
    /// fields; anything else, including an empty Ollama key, passes.
    pub fn is_configured(&self) -> bool {
        self.language_model != PENDING && self.api_key != PENDING
    }

    /// The JSON body for the `update_model_config` endpoint.
    pub fn wire_body(&self, chat_id: i64) -> serde_json::Value {
        json!({
            "provider": self.provider.short_name(),
            "language_model": self.language_model,
            "model_type": self.provider.wire_name(),
            "api_key": self.api_key,
            "temperature": self.temperature,
            "chat_id": chat_id,
        })
    }

    /// Parse a `get_model_config` response body. Returns `None` when
    /// the shape is not a config object (e.g. an error payload).
    pub fn from_wire(value: &serde_json::Value) -> Option<Self> {
        let provider = Provider::from_wire(value.get("model_type")?.as_str()?)?;
        let language_model = value
            .get("language_model")
            .and_then(|v| v.as_str())
            .unwrap_or(PENDING)
            .to_string();
        let api_key = value
            .get("api_key")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let temperature = value
            .get("temperature")
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_TEMPERATURE);

        Some(Self {
            provider,
            language_model,
            api_key,
            temperature,
        })
    }
}
