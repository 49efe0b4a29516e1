//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/parley/config.toml).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::knowledge::Similarity;

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# parley configuration file
# Located at: ~/.config/parley/config.toml
#
# This file contains non-sensitive configuration.
# Secrets (API keys) are loaded from environment variables:
#   - OPENAI_API_KEY

[gateway]
host = "127.0.0.1"
port = 8000
cors_origins = ["http://localhost:3000"]

[providers]
base_url = "https://api.openai.com/v1"
chat_model = "gpt-4"
temperature = 0.7
max_tokens = 500
timeout_seconds = 120

[knowledge]
embedding_url = "https://api.openai.com/v1"
embedding_model = "text-embedding-3-small"
top_k = 3
similarity = "dot"
# embedding_dim = 1536
# max_items = 10000

[sessions]
idle_ttl_minutes = 60

[tools]
max_iterations = 5

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
///
/// These are non-sensitive configuration values that can be safely
/// stored in files and version controlled (excluding secrets).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Gateway server configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Completion provider configuration
    #[serde(default)]
    pub providers: ProviderSettings,

    /// Knowledge store and retrieval configuration
    #[serde(default)]
    pub knowledge: KnowledgeTomlSettings,

    /// Conversation lifecycle configuration
    #[serde(default)]
    pub sessions: SessionSettings,

    /// Tool calling configuration
    #[serde(default)]
    pub tools: ToolsSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Gateway server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// Completion provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Model used for every chat mode
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature for basic conversations
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Reply token cap for basic conversations
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout applied to every provider call
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Knowledge configuration as written in TOML (all optional).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeTomlSettings {
    /// Embedding provider base URL
    pub embedding_url: Option<String>,

    /// Embedding model name
    pub embedding_model: Option<String>,

    /// Embedding dimension (if known)
    pub embedding_dim: Option<usize>,

    /// Number of texts injected into RAG prompts
    pub top_k: Option<usize>,

    /// Retention cap; oldest items are evicted first
    pub max_items: Option<usize>,

    /// Scoring function ("dot" or "cosine")
    pub similarity: Option<Similarity>,
}

/// Conversation lifecycle settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Minutes without a message before a conversation is dropped
    #[serde(default = "default_idle_ttl_minutes")]
    pub idle_ttl_minutes: u64,
}

/// Tool calling settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsSettings {
    /// Upper bound on tool-use round trips per request
    #[serde(default = "default_tool_max_iterations")]
    pub max_iterations: usize,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_provider_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_idle_ttl_minutes() -> u64 {
    60
}

fn default_tool_max_iterations() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_ttl_minutes: default_idle_ttl_minutes(),
        }
    }
}

impl Default for ToolsSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_tool_max_iterations(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    /// The file is located at `~/.config/parley/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load settings from `path`, writing the default file there first if
    /// it is missing.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/parley/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("PARLEY_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("parley");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.gateway.port, 8000);
        assert_eq!(settings.gateway.cors_origins, vec!["http://localhost:3000"]);

        assert_eq!(settings.providers.chat_model, "gpt-4");
        assert_eq!(settings.providers.max_tokens, 500);
        assert!((settings.providers.temperature - 0.7).abs() < f32::EPSILON);

        assert!(settings.knowledge.top_k.is_none());
        assert!(settings.knowledge.max_items.is_none());

        assert_eq!(settings.sessions.idle_ttl_minutes, 60);
        assert_eq!(settings.tools.max_iterations, 5);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        let defaults = Settings::default();

        assert_eq!(settings.gateway.port, defaults.gateway.port);
        assert_eq!(settings.providers.chat_model, defaults.providers.chat_model);
        assert_eq!(settings.knowledge.top_k, Some(3));
        assert_eq!(settings.knowledge.similarity, Some(Similarity::Dot));
        assert_eq!(
            settings.knowledge.embedding_model.as_deref(),
            Some("text-embedding-3-small")
        );
    }

    #[test]
    fn test_bind_addr() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[gateway]
port = 9000

[knowledge]
similarity = "cosine"
max_items = 50
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.gateway.host, "127.0.0.1");
        assert_eq!(settings.gateway.port, 9000);
        assert_eq!(settings.knowledge.similarity, Some(Similarity::Cosine));
        assert_eq!(settings.knowledge.max_items, Some(50));
        assert_eq!(settings.providers.timeout_seconds, 120);
    }

    #[test]
    fn test_load_from_path_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let settings = Settings::load_from_path(&path).unwrap();
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TOML);
        assert_eq!(settings.gateway.port, 8000);
        assert_eq!(settings.knowledge.top_k, Some(3));
    }

    #[test]
    fn test_load_from_path_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[providers]\nchat_model = \"gpt-4o-mini\"\n").unwrap();

        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(settings.providers.chat_model, "gpt-4o-mini");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[providers]\nchat_model = \"gpt-4o-mini\"\n"
        );
    }
}
