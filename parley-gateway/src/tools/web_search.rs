use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::{Tool, parse_args};

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    query: String,
}

/// Placeholder web search; echoes the query back.
pub struct WebSearchTool;

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for information"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: WebSearchInput = parse_args(args)?;
        Ok(format!("Search results for: {}", input.query))
    }
}
