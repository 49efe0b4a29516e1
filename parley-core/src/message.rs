use serde::{Deserialize, Serialize};

/// How a chat request is answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Per-user conversation with history
    #[default]
    Basic,
    /// Single-turn request with function calling
    Tools,
    /// Single-turn request answered from the knowledge store
    Rag,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Basic => "basic",
            ChatMode::Tools => "tools",
            ChatMode::Rag => "rag",
        }
    }

    /// Parse a mode name, falling back to `Basic` for anything unknown.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ChatMode::Basic),
            "tools" | "tool" => Ok(ChatMode::Tools),
            "rag" => Ok(ChatMode::Rag),
            _ => Err(format!("Unknown chat mode: {}", s)),
        }
    }
}

/// `POST /chat` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ChatRequest {
    pub fn mode(&self) -> ChatMode {
        self.mode
            .as_deref()
            .map(ChatMode::parse_lenient)
            .unwrap_or_default()
    }
}

/// `POST /chat` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// `POST /add-knowledge` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRequest {
    pub text: String,
}

/// `POST /clear` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearRequest {
    pub user_id: String,
}

/// Acknowledgement for state-changing routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: String,
    pub message: String,
}

impl StatusReply {
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
        }
    }
}
