use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::chat::history::ChatMessage;
use crate::providers::provider::{GenerationOptions, Provider, ProviderError, require_text};
use crate::rag::RagError;

/// Errors that can occur while answering a chat request
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Completion provider error: {0}")]
    Completion(#[from] ProviderError),

    #[error("{0}")]
    Rag(#[from] RagError),
}

/// One user's running conversation.
#[derive(Debug)]
struct Conversation {
    system_prompt: Option<String>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    fn new(system_prompt: Option<&str>) -> Self {
        Self {
            system_prompt: system_prompt
                .filter(|prompt| !prompt.trim().is_empty())
                .map(str::to_string),
            messages: Vec::new(),
        }
    }
}

/// Map slot for a conversation. `last_active` lives here, not inside the
/// conversation, so it is only read and written under the map lock.
#[derive(Debug)]
struct Entry {
    conversation: Arc<Mutex<Conversation>>,
    last_active: Instant,
}

/// Multi-turn chat keyed by user id.
///
/// A conversation is created on a user's first message and lives until it
/// is cleared or swept after `idle_ttl` without activity. History only ever
/// holds completed exchanges: when the provider fails, the user message is
/// not recorded.
pub struct SessionChat {
    provider: Arc<dyn Provider>,
    options: GenerationOptions,
    idle_ttl: Duration,
    conversations: Mutex<HashMap<String, Entry>>,
}

impl SessionChat {
    pub fn new(
        provider: Arc<dyn Provider>,
        options: GenerationOptions,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            options,
            idle_ttl,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Send `message` in `user_id`'s conversation and return the reply.
    ///
    /// `system_prompt` only applies when this message opens the
    /// conversation; later values are ignored.
    pub async fn chat(
        &self,
        user_id: &str,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ChatError> {
        let conversation = self.checkout(user_id, system_prompt).await;

        // Held across the provider call so turns from one user are serialized.
        let mut conversation = conversation.lock().await;

        let response = self
            .provider
            .send_conversation(
                conversation.system_prompt.clone(),
                conversation.messages.clone(),
                vec![],
                Some(message),
                &self.options,
            )
            .await?;
        let reply = require_text(&response)?;

        conversation.messages.push(ChatMessage::user_text(message));
        conversation
            .messages
            .push(ChatMessage::assistant_text(reply.clone()));

        debug!(
            user_id,
            turns = conversation.messages.len() / 2,
            "conversation updated"
        );
        drop(conversation);
        self.touch(user_id).await;

        Ok(reply)
    }

    /// Conversation for `user_id`, created on first use. Activity is stamped
    /// before the map lock is released, so a sweep running before the caller
    /// locks the conversation still sees it as fresh.
    async fn checkout(
        &self,
        user_id: &str,
        system_prompt: Option<&str>,
    ) -> Arc<Mutex<Conversation>> {
        let mut conversations = self.conversations.lock().await;
        let entry = conversations.entry(user_id.to_string()).or_insert_with(|| {
            info!(user_id, "starting conversation");
            Entry {
                conversation: Arc::new(Mutex::new(Conversation::new(system_prompt))),
                last_active: Instant::now(),
            }
        });
        entry.last_active = Instant::now();
        Arc::clone(&entry.conversation)
    }

    async fn touch(&self, user_id: &str) {
        if let Some(entry) = self.conversations.lock().await.get_mut(user_id) {
            entry.last_active = Instant::now();
        }
    }

    /// Forget `user_id`'s conversation. Returns whether one existed.
    pub async fn clear(&self, user_id: &str) -> bool {
        let removed = self.conversations.lock().await.remove(user_id).is_some();
        if removed {
            info!(user_id, "conversation cleared");
        }
        removed
    }

    /// Completed messages for `user_id`, oldest first.
    pub async fn history(&self, user_id: &str) -> Option<Vec<ChatMessage>> {
        let conversation = self.conversation(user_id).await?;
        let conversation = conversation.lock().await;
        Some(conversation.messages.clone())
    }

    /// System instruction attached to `user_id`'s conversation.
    pub async fn system_prompt(&self, user_id: &str) -> Option<String> {
        let conversation = self.conversation(user_id).await?;
        let conversation = conversation.lock().await;
        conversation.system_prompt.clone()
    }

    async fn conversation(&self, user_id: &str) -> Option<Arc<Mutex<Conversation>>> {
        let conversations = self.conversations.lock().await;
        conversations
            .get(user_id)
            .map(|entry| Arc::clone(&entry.conversation))
    }

    pub async fn len(&self) -> usize {
        self.conversations.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop conversations idle for at least `idle_ttl`.
    ///
    /// Conversations with a request in flight are skipped. Returns the number
    /// removed.
    pub async fn sweep_idle(&self) -> usize {
        let mut conversations = self.conversations.lock().await;
        let before = conversations.len();
        conversations.retain(|_, entry| {
            entry.last_active.elapsed() < self.idle_ttl || entry.conversation.try_lock().is_err()
        });
        let removed = before - conversations.len();
        if removed > 0 {
            info!(removed, "swept idle conversations");
        }
        removed
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }
}
