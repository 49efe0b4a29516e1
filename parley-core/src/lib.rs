pub mod config;
pub mod message;

pub use config::{
    Config, ConfigError, GatewaySettings, KnowledgeSettings, KnowledgeTomlSettings,
    LoggingSettings, ProviderSettings, Secrets, SecretsError, SessionSettings, Settings,
    SettingsError, Similarity, ToolsSettings, load_dotenv,
};

pub use message::{ChatMode, ChatReply, ChatRequest, ClearRequest, KnowledgeRequest, StatusReply};
