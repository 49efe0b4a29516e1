//! Configuration management for parley.
//!
//! This module provides a unified configuration system that separates
//! secrets (from environment variables) from settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `OPENAI_API_KEY` - key for the chat and embedding endpoints
//!
//! ## Settings (TOML File)
//! Located at `~/.config/parley/config.toml`:
//! ```toml
//! [gateway]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [providers]
//! chat_model = "gpt-4"
//!
//! [knowledge]
//! embedding_model = "text-embedding-3-small"
//! top_k = 3
//!
//! [logging]
//! level = "info"
//! ```

pub mod knowledge;
mod secrets;
mod settings;

pub use knowledge::{KnowledgeSettings, Similarity};
pub use secrets::{Secrets, SecretsError};
pub use settings::{
    GatewaySettings, KnowledgeTomlSettings, LoggingSettings, ProviderSettings, SessionSettings,
    Settings, SettingsError, ToolsSettings,
};

/// Combined configuration containing both secrets and settings.
///
/// This is the main configuration type used throughout the application.
/// It separates sensitive secrets (from env) from non-sensitive settings (from TOML).
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Chat model is not set")]
    ChatModelNotSet,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// This loads:
    /// 1. Secrets from environment variables
    /// 2. Settings from TOML file (creating defaults if needed)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `OPENAI_API_KEY` is not set
    /// - The TOML file cannot be read or parsed
    /// - The chat model is blank
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env()?;
        let settings = Settings::load()?;

        if settings.providers.chat_model.trim().is_empty() {
            return Err(ConfigError::ChatModelNotSet);
        }

        Ok(Self { secrets, settings })
    }

    /// Get the chat model identifier.
    pub fn chat_model(&self) -> &str {
        &self.settings.providers.chat_model
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }

    /// Get the OpenAI API key (if configured).
    pub fn openai_api_key(&self) -> Option<&str> {
        self.secrets.openai_api_key.as_deref()
    }

    /// Resolve knowledge settings from the `[knowledge]` section.
    pub fn knowledge_settings(&self) -> KnowledgeSettings {
        KnowledgeSettings::from(&self.settings.knowledge)
    }

    /// Request timeout shared by every provider client.
    pub fn provider_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.settings.providers.timeout_seconds)
    }
}

/// Load .env file if it exists (for development convenience).
///
/// This is called automatically by `Config::load()` but is also
/// exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
