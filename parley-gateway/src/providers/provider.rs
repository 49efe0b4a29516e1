//! Provider trait for abstracting chat completion backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::history::ChatMessage;
use crate::tools::Tool;

/// Unified content block across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use request from assistant
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
}

/// Unified usage information across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Unified response type across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<ProviderContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ProviderUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Sampling knobs forwarded with a completion request.
///
/// `None` leaves the field out of the request so the backend default applies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Provider error types
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("No content in response")]
    NoContent,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

/// Provider trait for different LLM backends
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Current model
    fn model(&self) -> &str;

    /// Send a simple single-turn message.
    async fn send_message(&self, content: &str) -> Result<ProviderResponse, ProviderError> {
        self.send_conversation(
            None,
            vec![],
            vec![],
            Some(content),
            &GenerationOptions::default(),
        )
        .await
    }

    /// Send a conversation and get response
    async fn send_conversation(
        &self,
        system: Option<String>,
        history: Vec<ChatMessage>,
        tools: Vec<&dyn Tool>,
        new_message: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<ProviderResponse, ProviderError>;
}

/// Extract all text content from a response
pub fn extract_all_text(response: &ProviderResponse) -> String {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ProviderContentBlock::Text { text } => Some(text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check if the response has tool uses
pub fn has_tool_uses(response: &ProviderResponse) -> bool {
    response
        .content
        .iter()
        .any(|block| matches!(block, ProviderContentBlock::ToolUse { .. }))
}

/// Text of a completion, or `NoContent` when the model returned none.
pub fn require_text(response: &ProviderResponse) -> Result<String, ProviderError> {
    let text = extract_all_text(response);
    if text.is_empty() {
        Err(ProviderError::NoContent)
    } else {
        Ok(text)
    }
}
