use std::sync::Arc;

use parley_knowledge::{KnowledgeEngine, KnowledgeError};
use tracing::debug;

use crate::providers::provider::{GenerationOptions, Provider, ProviderError, require_text};

/// Prefix of the system instruction when context was found.
pub const RAG_CONTEXT_PREFIX: &str = "Use this context to answer:\n";

/// System instruction when the knowledge store returned nothing.
pub const NO_CONTEXT_INSTRUCTION: &str =
    "No relevant context found. Answer based on your knowledge.";

/// Errors from a retrieval-augmented answer.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("Knowledge retrieval failed: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Completion provider error: {0}")]
    Completion(#[from] ProviderError),
}

/// Build the system instruction for a set of retrieved texts.
pub fn build_rag_instruction(texts: &[String]) -> String {
    if texts.is_empty() {
        NO_CONTEXT_INSTRUCTION.to_string()
    } else {
        format!("{RAG_CONTEXT_PREFIX}{}", texts.join("\n\n"))
    }
}

/// Answers single questions grounded on the knowledge store.
pub struct RagChat {
    provider: Arc<dyn Provider>,
    knowledge: Arc<KnowledgeEngine>,
}

impl RagChat {
    pub fn new(provider: Arc<dyn Provider>, knowledge: Arc<KnowledgeEngine>) -> Self {
        Self {
            provider,
            knowledge,
        }
    }

    /// Retrieve the top texts for `query`, then ask the model with them as
    /// the system instruction. Returns the model's text verbatim.
    pub async fn answer(&self, query: &str) -> Result<String, RagError> {
        let texts = self
            .knowledge
            .retrieve(query, self.knowledge.default_top_k())
            .await?;
        debug!(hits = texts.len(), "retrieved context");

        let instruction = build_rag_instruction(&texts);
        let response = self
            .provider
            .send_conversation(
                Some(instruction),
                vec![],
                vec![],
                Some(query),
                &GenerationOptions::default(),
            )
            .await?;

        Ok(require_text(&response)?)
    }
}
