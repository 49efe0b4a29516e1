use std::sync::Arc;

use tracing::{info, warn};

use crate::chat::history::{
    ChatContentBlock, ChatMessage, ChatRole, ToolResultData, build_tool_result_message,
};
use crate::providers::provider::{
    GenerationOptions, Provider, ProviderContentBlock, ProviderError, ProviderResponse,
    has_tool_uses, require_text,
};
use crate::tools::ToolManager;

/// Single-shot chat where the model may call the registered tools.
pub struct ToolChat {
    provider: Arc<dyn Provider>,
    tool_manager: ToolManager,
    max_iterations: usize,
}

impl ToolChat {
    pub fn new(provider: Arc<dyn Provider>, max_iterations: usize) -> Self {
        Self {
            provider,
            tool_manager: ToolManager::new(),
            max_iterations,
        }
    }

    /// Answer `message`, running requested tools and feeding their results
    /// back until the model replies with text or `max_iterations` rounds of
    /// tool calls have been served.
    pub async fn chat(&self, message: &str) -> Result<String, ProviderError> {
        let tools = self.tool_manager.get_tools();
        let options = GenerationOptions::default();
        let mut history = vec![ChatMessage::user_text(message)];

        let mut response = self
            .provider
            .send_conversation(None, history.clone(), tools.clone(), None, &options)
            .await?;

        for iteration in 0..self.max_iterations {
            if !has_tool_uses(&response) {
                break;
            }

            info!(iteration = iteration + 1, "tool use requested");

            history.push(assistant_message(&response));
            let results = self.execute_tools_from_response(&response).await;
            history.push(build_tool_result_message(results));

            response = self
                .provider
                .send_conversation(None, history.clone(), tools.clone(), None, &options)
                .await?;
        }

        if has_tool_uses(&response) {
            warn!(
                max_iterations = self.max_iterations,
                "tool loop stopped with calls still pending"
            );
        }

        require_text(&response)
    }

    /// Execute all tool_use blocks from a response and return the results
    async fn execute_tools_from_response(
        &self,
        response: &ProviderResponse,
    ) -> Vec<ToolResultData> {
        let mut results = Vec::new();

        for block in &response.content {
            let ProviderContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };

            info!(tool = %name, id = %id, "executing tool");

            let (content, is_error) = match self.tool_manager.execute(name, input.clone()).await {
                Ok(output) => (output, None),
                Err(e) => (e, Some(true)),
            };

            results.push(ToolResultData {
                tool_use_id: id.clone(),
                content,
                is_error,
            });
        }

        results
    }
}

/// Record the assistant turn (text and tool calls) in history.
fn assistant_message(response: &ProviderResponse) -> ChatMessage {
    let content = response
        .content
        .iter()
        .map(|block| match block {
            ProviderContentBlock::Text { text } => ChatContentBlock::Text { text: text.clone() },
            ProviderContentBlock::ToolUse { id, name, input } => ChatContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
        })
        .collect();

    ChatMessage {
        role: ChatRole::Assistant,
        content,
    }
}
