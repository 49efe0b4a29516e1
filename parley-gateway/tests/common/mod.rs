//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use parley_core::Settings;
use parley_gateway::chat::ChatMessage;
use parley_gateway::state::AppState;
use parley_gateway::tools::Tool;
use parley_gateway::{
    GenerationOptions, Provider, ProviderContentBlock, ProviderError, ProviderResponse,
};
use parley_knowledge::{
    Embedder, KnowledgeEngine, KnowledgeError, KnowledgeResult, KnowledgeSettings,
};

/// One call made to the scripted provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: Option<String>,
    pub history: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
    pub new_message: Option<String>,
    pub options: GenerationOptions,
}

/// Completion provider that replays queued responses and records requests.
///
/// Once the queue is empty every call answers with the text `"ok"`.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_text(&self, text: &str) {
        self.push(Ok(response(vec![ProviderContentBlock::Text {
            text: text.to_string(),
        }])));
    }

    pub fn push_tool_call(&self, id: &str, name: &str, input: serde_json::Value) {
        self.push(Ok(response(vec![ProviderContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }])));
    }

    pub fn push_error(&self, status: u16, message: &str) {
        self.push(Err(ProviderError::ApiError {
            status,
            message: message.to_string(),
        }));
    }

    pub fn push(&self, reply: Result<ProviderResponse, ProviderError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

pub fn response(content: Vec<ProviderContentBlock>) -> ProviderResponse {
    ProviderResponse {
        id: "chatcmpl-test".to_string(),
        model: "scripted".to_string(),
        content,
        usage: None,
        stop_reason: None,
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn send_conversation(
        &self,
        system: Option<String>,
        history: Vec<ChatMessage>,
        tools: Vec<&dyn Tool>,
        new_message: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system,
            history,
            tool_names: tools.iter().map(|tool| tool.name().to_string()).collect(),
            new_message: new_message.map(str::to_string),
            options: *options,
        });

        let reply = self.replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| {
            Ok(response(vec![ProviderContentBlock::Text {
                text: "ok".to_string(),
            }]))
        })
    }
}

/// Embeds text as keyword counts over a fixed vocabulary.
///
/// Any text containing `"boom"` fails like an unreachable provider.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

pub const VOCABULARY: [&str; 3] = ["paris", "rust", "weather"];

impl KeywordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Embedder for KeywordEmbedder {
    fn model(&self) -> &str {
        "keywords"
    }

    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        if lower.contains("boom") {
            return Err(KnowledgeError::Embedding(
                "embedding request failed: 503 Service Unavailable".to_string(),
            ));
        }
        Ok(VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f64)
            .collect())
    }
}

pub fn knowledge_engine(embedder: Arc<KeywordEmbedder>) -> Arc<KnowledgeEngine> {
    Arc::new(KnowledgeEngine::new(KnowledgeSettings::default(), embedder))
}

/// App state over a scripted provider and keyword embedder, default settings.
pub fn app_state(
    provider: Arc<ScriptedProvider>,
    embedder: Arc<KeywordEmbedder>,
) -> Arc<AppState> {
    Arc::new(AppState::new(
        provider,
        knowledge_engine(embedder),
        &Settings::default(),
    ))
}
