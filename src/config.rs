//! Persisted settings.
//!
//! Settings live in `~/.cheapllm/config.json`.  The file is a flat JSON object;
//! keys that are missing fall back to their defaults one by one, and a file that
//! cannot be read or parsed is treated as absent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_BASE_URL;
use crate::error::{Error, Result};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Token limit used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
/// System prompt seeded into fresh settings.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";
/// Environment variable that supplies an API key when the file has none.
pub const API_KEY_ENV: &str = "CHEAPLLM_API_KEY";
/// Printed when [`Settings::is_configured`] is false.
pub const SETUP_HINT: &str = "No API configured yet. Run:
    cheapllm-config init

or set values by hand:
    cheapllm-config set api_key \"your-api-key\"
    cheapllm-config set base_url \"https://api.deepseek.com/v1\"

A key can also come from the CHEAPLLM_API_KEY environment variable.";

const CONFIG_DIR: &str = ".cheapllm";
const CONFIG_FILE: &str = "config.json";

/// Keys accepted by [`Settings::set`], in display order.
pub const SETTING_KEYS: &[&str] = &[
    "api_key",
    "base_url",
    "model",
    "temperature",
    "max_tokens",
    "system_prompt",
];

/// Returns true if `base_url` points at this machine.
///
/// This is a substring test on `localhost` and `127.0.0.1`; other loopback
/// spellings such as `[::1]` are not recognised.
pub fn is_local_endpoint(base_url: &str) -> bool {
    base_url.contains("localhost") || base_url.contains("127.0.0.1")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// The flat settings mapping consumed by [`ChatSession::from_settings`](crate::chat::ChatSession::from_settings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Bearer token; empty means none.
    #[serde(default)]
    pub api_key: String,

    /// Chat Completions base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature in `[0, 2]`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System prompt; empty means none.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: default_system_prompt(),
        }
    }
}

impl Settings {
    /// Returns true if requests can be made: a key is set or the endpoint is local.
    pub fn is_configured(&self) -> bool {
        is_local_endpoint(&self.base_url) || !self.api_key.is_empty()
    }

    /// Returns true if the configured endpoint is on this machine.
    pub fn is_local(&self) -> bool {
        is_local_endpoint(&self.base_url)
    }

    /// The API key, shortened for display.
    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }

    /// Fill an empty API key from `CHEAPLLM_API_KEY`.
    pub fn with_env_overrides(mut self) -> Self {
        if self.api_key.is_empty()
            && let Ok(key) = std::env::var(API_KEY_ENV)
        {
            self.api_key = key;
        }
        self
    }

    /// Set one setting from its textual form.
    ///
    /// `temperature` must parse as a number in `[0, 2]`, `max_tokens` as a
    /// positive integer, and `base_url` as a URL (a trailing `/` is dropped).
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown keys or values that do not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_key" => self.api_key = value.trim().to_string(),
            "base_url" => {
                let trimmed = value.trim().trim_end_matches('/');
                url::Url::parse(trimmed)?;
                self.base_url = trimmed.to_string();
            }
            "model" => {
                if value.trim().is_empty() {
                    return Err(Error::validation(
                        "model must not be empty",
                        Some(key.to_string()),
                    ));
                }
                self.model = value.trim().to_string();
            }
            "temperature" => {
                let temperature: f32 = value.trim().parse().map_err(|_| {
                    Error::validation(
                        format!("temperature must be a number, got {value:?}"),
                        Some(key.to_string()),
                    )
                })?;
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(Error::validation(
                        format!("temperature must be between 0 and 2, got {temperature}"),
                        Some(key.to_string()),
                    ));
                }
                self.temperature = temperature;
            }
            "max_tokens" => {
                let max_tokens: u32 = value.trim().parse().map_err(|_| {
                    Error::validation(
                        format!("max_tokens must be a positive integer, got {value:?}"),
                        Some(key.to_string()),
                    )
                })?;
                if max_tokens == 0 {
                    return Err(Error::validation(
                        "max_tokens must be a positive integer, got 0",
                        Some(key.to_string()),
                    ));
                }
                self.max_tokens = max_tokens;
            }
            "system_prompt" => self.system_prompt = value.to_string(),
            _ => {
                return Err(Error::validation(
                    format!("unknown setting {key:?}; expected one of {}", SETTING_KEYS.join(", ")),
                    Some(key.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// `(key, value)` pairs for display, with the API key masked.
    pub fn display_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.masked_api_key()),
            ("base_url", self.base_url.clone()),
            ("model", self.model.clone()),
            ("temperature", self.temperature.to_string()),
            ("max_tokens", self.max_tokens.to_string()),
            ("system_prompt", self.system_prompt.clone()),
        ]
    }
}

/// Shorten a secret to `first8...last4`, or `****` when it is short.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

/// Reads and writes [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// The store at `~/.cheapllm/config.json`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the home directory cannot be determined.
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            Error::validation("cannot determine the home directory", None)
        })?;
        Ok(Self::at(home.join(CONFIG_DIR).join(CONFIG_FILE)))
    }

    /// The store at `path` if given, else the default one.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::open_default`].
    pub fn open(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::at(path)),
            None => Self::open_default(),
        }
    }

    /// A store backed by `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(&self) -> Settings {
        self.try_load().ok().flatten().unwrap_or_default()
    }

    /// Load settings, distinguishing a missing file from a broken one.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read, or a
    /// serialization error if it is not a JSON object of settings.
    pub fn try_load(&self) -> Result<Option<Settings>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::io("failed to read config file", err)),
        };
        let settings = serde_json::from_str::<Settings>(&text).map_err(|err| {
            Error::serialization("failed to parse config file", Some(Box::new(err)))
        })?;
        Ok(Some(settings))
    }

    /// Write `settings` as pretty JSON, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create config directory", err))?;
        }
        let text = serde_json::to_string_pretty(settings).map_err(|err| {
            Error::serialization("failed to serialize settings", Some(Box::new(err)))
        })?;
        fs::write(&self.path, text).map_err(|err| Error::io("failed to write config file", err))
    }

    /// Load, update one key, and save.
    ///
    /// # Errors
    ///
    /// Returns the validation error from [`Settings::set`] or an I/O error from
    /// [`ConfigStore::save`].  The file is untouched when validation fails.
    pub fn set(&self, key: &str, value: &str) -> Result<Settings> {
        let mut settings = self.load();
        settings.set(key, value)?;
        self.save(&settings)?;
        Ok(settings)
    }
}
