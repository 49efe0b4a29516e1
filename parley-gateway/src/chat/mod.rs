pub mod history;

pub use history::{
    ChatContentBlock, ChatMessage, ChatRole, ToolResultData, build_tool_result_message,
};
