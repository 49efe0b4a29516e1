use std::sync::Arc;
use std::time::Duration;

use parley_core::{ChatMode, ChatRequest, Settings};
use parley_knowledge::{KnowledgeEngine, KnowledgeResult};
use tracing::info;

use crate::providers::provider::{GenerationOptions, Provider};
use crate::rag::RagChat;
use crate::session::{ChatError, SessionChat};
use crate::tool_chat::ToolChat;

/// Shared application state
///
/// Every chat mode shares one completion provider; the RAG mode also
/// shares the knowledge engine with `/add-knowledge`.
pub struct AppState {
    /// Knowledge store backing `/add-knowledge` and RAG answers
    pub knowledge: Arc<KnowledgeEngine>,
    /// Per-user conversations for basic mode
    pub sessions: SessionChat,
    /// Function-calling mode
    pub tool_chat: ToolChat,
    /// Retrieval-augmented mode
    pub rag: RagChat,
    model: String,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn Provider>,
        knowledge: Arc<KnowledgeEngine>,
        settings: &Settings,
    ) -> Self {
        let options = GenerationOptions {
            temperature: Some(settings.providers.temperature),
            max_tokens: Some(settings.providers.max_tokens),
        };
        let idle_ttl = Duration::from_secs(settings.sessions.idle_ttl_minutes.saturating_mul(60));

        Self {
            knowledge: Arc::clone(&knowledge),
            sessions: SessionChat::new(Arc::clone(&provider), options, idle_ttl),
            tool_chat: ToolChat::new(Arc::clone(&provider), settings.tools.max_iterations),
            rag: RagChat::new(Arc::clone(&provider), knowledge),
            model: provider.model().to_string(),
        }
    }

    /// Model answering every chat mode
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Route a chat request to the mode it asks for.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let mode = request.mode();
        info!(user_id = %request.user_id, mode = %mode, "chat request");

        match mode {
            ChatMode::Tools => Ok(self.tool_chat.chat(&request.message).await?),
            ChatMode::Rag => Ok(self.rag.answer(&request.message).await?),
            ChatMode::Basic => {
                self.sessions
                    .chat(
                        &request.user_id,
                        &request.message,
                        request.system_prompt.as_deref(),
                    )
                    .await
            }
        }
    }

    /// Embed and store one knowledge text.
    pub async fn add_knowledge(&self, text: &str) -> KnowledgeResult<()> {
        self.knowledge.add(text).await
    }

    /// Forget a user's basic-mode conversation.
    pub async fn clear(&self, user_id: &str) -> bool {
        self.sessions.clear(user_id).await
    }
}
