//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the immutable
//! per-session request configuration.

use arrrg_derive::CommandLine;

use crate::client::DEFAULT_BASE_URL;
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, Settings};

/// Command-line arguments for the cheapllm-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for this session.
    #[arrrg(optional, "Model to use (overrides the configured model)", "MODEL")]
    pub model: Option<String>,

    /// System prompt for this session.
    #[arrrg(optional, "System prompt (overrides the configured prompt)", "PROMPT")]
    pub system: Option<String>,

    /// Settings file to read instead of ~/.cheapllm/config.json.
    #[arrrg(optional, "Settings file (default: ~/.cheapllm/config.json)", "PATH")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Command-line arguments for the cheapllm-ask tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct AskArgs {
    /// Model to use for this question.
    #[arrrg(optional, "Model to use (overrides the configured model)", "MODEL")]
    pub model: Option<String>,

    /// Settings file to read instead of ~/.cheapllm/config.json.
    #[arrrg(optional, "Settings file (default: ~/.cheapllm/config.json)", "PATH")]
    pub config: Option<String>,

    /// Wait for the whole reply instead of streaming it.
    #[arrrg(flag, "Print the reply only once it is complete")]
    pub no_stream: bool,
}

/// Immutable request configuration for one chat session.
///
/// Overrides are applied with the builder methods before the session is
/// constructed; the session never changes its configuration afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Chat Completions base URL, without a trailing slash.
    pub base_url: String,

    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,

    /// The model identifier sent with every request.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens per response.
    pub max_tokens: u32,

    /// Optional system prompt seeded at the head of the history.
    pub system_prompt: Option<String>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: https://api.openai.com/v1
    /// - Model: gpt-3.5-turbo
    /// - Temperature: 0.7
    /// - Max tokens: 2048
    /// - No API key, no system prompt
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }

    /// Sets the base URL, dropping any trailing slash.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the API key; an empty key means none.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|key| !key.is_empty());
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the system prompt; an empty prompt means none.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into()).filter(|p| !p.is_empty());
        self
    }

    /// Applies command-line overrides on top of the current values.
    pub fn with_overrides(mut self, model: Option<String>, system: Option<String>) -> Self {
        if let Some(model) = model {
            self = self.with_model(model);
        }
        if let Some(system) = system {
            self = self.with_system_prompt(system);
        }
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Settings> for ChatConfig {
    fn from(settings: &Settings) -> Self {
        ChatConfig::new()
            .with_base_url(settings.base_url.clone())
            .with_api_key(settings.api_key.clone())
            .with_model(settings.model.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_system_prompt(settings.system_prompt.clone())
    }
}
