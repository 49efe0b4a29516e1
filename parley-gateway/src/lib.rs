pub mod chat;
pub mod providers;
pub mod rag;
pub mod server;
pub mod session;
pub mod state;
pub mod tool_chat;
pub mod tools;

pub use providers::provider::{
    GenerationOptions, Provider, ProviderContentBlock, ProviderError, ProviderResponse,
    ProviderUsage, extract_all_text, has_tool_uses,
};
pub use rag::{RagChat, RagError};
pub use session::{ChatError, SessionChat};
pub use state::AppState;
pub use tool_chat::ToolChat;
