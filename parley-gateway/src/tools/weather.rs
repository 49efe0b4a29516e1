use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::{Tool, parse_args};

#[derive(Debug, Deserialize)]
struct WeatherInput {
    location: String,
}

/// Canned weather lookup.
pub struct WeatherTool;

#[async_trait::async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather for a location"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "City name"}
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: WeatherInput = parse_args(args)?;
        Ok(format!("Weather in {}: 72°F, Sunny", input.location))
    }
}
