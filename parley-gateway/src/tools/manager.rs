use serde_json::Value;

use super::{Tool, weather::WeatherTool, web_search::WebSearchTool};

/// Result text returned to the model for a tool name nobody registered.
pub const UNKNOWN_TOOL: &str = "Function not found";

/// Central registry of the tools offered to the model.
///
/// Used by `ToolChat` to run the tool-use loop without exposing tool
/// details to the HTTP layer.
pub struct ToolManager {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolManager {
    /// Create a new ToolManager with all available tools registered
    pub fn new() -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![Box::new(WeatherTool), Box::new(WebSearchTool)];
        Self { tools }
    }

    /// Get all tools as references for use with the provider API
    pub fn get_tools(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    /// Execute a tool by name.
    ///
    /// Unknown names yield `Err(UNKNOWN_TOOL)`.
    pub async fn execute(&self, name: &str, input: Value) -> Result<String, String> {
        for tool in &self.tools {
            if tool.name() == name {
                return tool.execute(input).await;
            }
        }
        Err(UNKNOWN_TOOL.to_string())
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}
