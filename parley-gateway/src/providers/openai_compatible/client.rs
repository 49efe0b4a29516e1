//! OpenAI-compatible API client.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::chat::history::{ChatContentBlock, ChatMessage, ChatRole};
use crate::providers::provider::{
    GenerationOptions, Provider, ProviderContentBlock, ProviderError, ProviderResponse,
    ProviderUsage,
};
use crate::tools::Tool;

/// OpenAI-compatible API client.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

/// Request body for the Chat Completions API
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI-compatible message format
#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// OpenAI-compatible tool call
#[derive(Debug, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    r#type: String,
    function: ToolCallFunction,
}

/// Tool call function details
#[derive(Debug, Serialize, Deserialize)]
struct ToolCallFunction {
    name: String,
    arguments: String,
}

/// OpenAI-compatible tool definition
#[derive(Debug, Serialize)]
struct OpenAiToolDefinition {
    r#type: String,
    function: OpenAiFunctionDefinition,
}

/// OpenAI-compatible function definition
#[derive(Debug, Serialize)]
struct OpenAiFunctionDefinition {
    name: String,
    description: String,
    parameters: Value,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

/// Choice in the response
#[derive(Debug, Deserialize)]
struct Choice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

/// Usage information
#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl OpenAiCompatibleClient {
    /// Create a new OpenAI-compatible client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Build request headers with optional auth.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.api_key
            && let Ok(header_value) = HeaderValue::from_str(&format!("Bearer {}", api_key))
        {
            headers.insert(AUTHORIZATION, header_value);
        }

        headers
    }

    fn chat_completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Convert history to OpenAI format
    fn convert_messages(
        &self,
        history: Vec<ChatMessage>,
        new_message: Option<&str>,
    ) -> Vec<OpenAiMessage> {
        let mut messages: Vec<OpenAiMessage> = Vec::new();

        for msg in history {
            let mut text_parts = Vec::new();
            let mut tool_calls: Vec<ToolCall> = Vec::new();
            let mut tool_messages: Vec<OpenAiMessage> = Vec::new();

            for block in msg.content {
                match block {
                    ChatContentBlock::Text { text } => text_parts.push(text),
                    ChatContentBlock::ToolUse { id, name, input } => {
                        let arguments = match input {
                            Value::String(raw) => raw,
                            other => other.to_string(),
                        };
                        tool_calls.push(ToolCall {
                            id,
                            r#type: "function".to_string(),
                            function: ToolCallFunction { name, arguments },
                        });
                    }
                    ChatContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } => {
                        tool_messages.push(OpenAiMessage {
                            role: "tool".to_string(),
                            content: Some(content),
                            tool_calls: None,
                            tool_call_id: Some(tool_use_id),
                        });
                    }
                }
            }

            let text = if text_parts.is_empty() {
                None
            } else {
                Some(text_parts.join("\n"))
            };

            match msg.role {
                ChatRole::Assistant => {
                    if text.is_some() || !tool_calls.is_empty() {
                        messages.push(OpenAiMessage {
                            role: "assistant".to_string(),
                            content: text,
                            tool_calls: if tool_calls.is_empty() {
                                None
                            } else {
                                Some(tool_calls)
                            },
                            tool_call_id: None,
                        });
                    }
                }
                ChatRole::User => {
                    if let Some(text) = text {
                        messages.push(OpenAiMessage::text("user", text));
                    }
                }
            }

            messages.extend(tool_messages);
        }

        if let Some(content) = new_message {
            messages.push(OpenAiMessage::text("user", content));
        }

        messages
    }

    /// Convert tools to OpenAI format
    fn convert_tools(&self, tools: &[&dyn Tool]) -> Vec<OpenAiToolDefinition> {
        tools
            .iter()
            .map(|tool| OpenAiToolDefinition {
                r#type: "function".to_string(),
                function: OpenAiFunctionDefinition {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.input_schema(),
                },
            })
            .collect()
    }

    /// Convert OpenAI response to provider response
    fn convert_response(&self, response: ChatCompletionsResponse) -> ProviderResponse {
        let stop_reason = response
            .choices
            .first()
            .and_then(|c| c.finish_reason.clone());
        let choice = response.choices.into_iter().next();

        let content = match choice {
            Some(choice) => {
                let mut blocks = Vec::new();

                if let Some(text) = choice.message.content
                    && !text.is_empty()
                {
                    blocks.push(ProviderContentBlock::Text { text });
                }

                for tool_call in choice.message.tool_calls.unwrap_or_default() {
                    // Unparseable arguments are passed through raw so the tool
                    // can report the error back to the model.
                    let input = match serde_json::from_str(&tool_call.function.arguments) {
                        Ok(input) => input,
                        Err(e) => {
                            warn!(
                                tool = %tool_call.function.name,
                                error = %e,
                                "tool call arguments are not valid JSON"
                            );
                            Value::String(tool_call.function.arguments)
                        }
                    };
                    blocks.push(ProviderContentBlock::ToolUse {
                        id: tool_call.id,
                        name: tool_call.function.name,
                        input,
                    });
                }

                blocks
            }
            None => vec![],
        };

        ProviderResponse {
            id: response.id,
            model: response.model,
            content,
            usage: response.usage.map(|u| ProviderUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
            stop_reason,
        }
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_conversation(
        &self,
        system: Option<String>,
        history: Vec<ChatMessage>,
        tools: Vec<&dyn Tool>,
        new_message: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<ProviderResponse, ProviderError> {
        let url = self.chat_completions_url();

        let mut messages = Vec::new();
        if let Some(system) = system
            && !system.is_empty()
        {
            messages.push(OpenAiMessage::text("system", system));
        }
        messages.extend(self.convert_messages(history, new_message));

        let (tool_definitions, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (
                Some(self.convert_tools(&tools)),
                Some(serde_json::json!("auto")),
            )
        };

        let request_body = ChatCompletionsRequest {
            model: self.model.clone(),
            messages,
            tools: tool_definitions,
            tool_choice,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(
            model = %self.model,
            messages = request_body.messages.len(),
            "sending chat completion"
        );

        let response = self
            .http_client
            .post(&url)
            .headers(self.build_headers())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        let completions_response: ChatCompletionsResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                let preview = if response_text.len() > 500 {
                    &response_text[..response_text.floor_char_boundary(500)]
                } else {
                    &response_text
                };
                ProviderError::InvalidFormat(format!(
                    "Failed to parse chat completion response: {e}\nBody preview: {preview}"
                ))
            })?;
        Ok(self.convert_response(completions_response))
    }
}
