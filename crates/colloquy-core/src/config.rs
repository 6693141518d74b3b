use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ColloquyError, Result};

/// Top-level configuration for the Colloquy application.
///
/// Loaded from `~/.colloquy/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColloquyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl ColloquyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ColloquyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ColloquyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Address the API server binds to.
    pub host: String,
    /// API server port.
    pub port: u16,
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Origins allowed by CORS (the frontend dev servers).
    pub cors_allowed_origins: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: "~/.colloquy/data".to_string(),
            log_level: "info".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,
    /// Bearer token for the provider. Empty means unauthenticated (local).
    pub api_key: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Overall wall-clock budget spanning all attempts, in seconds.
    pub timeout_secs: u64,
    /// Maximum completion attempts (initial try plus retries).
    pub max_attempts: u32,
    /// Initial backoff delay between attempts, doubled each retry.
    pub backoff_base_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

/// Conversation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// How many recent messages are sent to the provider as context.
    pub context_window: usize,
    /// Maximum user message length in characters.
    pub max_message_chars: usize,
    /// System prompt prepended to every completion request.
    pub system_prompt: String,
    /// Fixed assistant reply used when the provider cannot be reached.
    pub fallback_content: String,
    /// Assistant greeting appended when a thread is created explicitly.
    pub welcome_content: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_window: 20,
            max_message_chars: 10_000,
            system_prompt: "You are a helpful assistant. Answer the user's questions \
                accurately and concisely."
                .to_string(),
            fallback_content: "I'm sorry, I wasn't able to generate a response just now. \
                Please try again in a moment."
                .to_string(),
            welcome_content: "Hello! I'm your AI assistant. How can I help you today?"
                .to_string(),
        }
    }
}
