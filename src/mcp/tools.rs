//! MCP tools implementation
//!
//! Defines the two weather tools and dispatches calls to a [`WeatherSource`].

use crate::mcp::protocol::{CallToolResult, Tool};
use crate::nws::WeatherSource;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const GET_ALERTS: &str = "get_alerts";
pub const GET_FORECAST: &str = "get_forecast";

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<Tool> {
    let read_only = serde_json::json!({
        "readOnlyHint": true,
        "openWorldHint": true
    });

    vec![
        Tool {
            name: GET_ALERTS.to_string(),
            description: "Get active weather alerts for a US state from the National Weather Service.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "state": {
                        "type": "string",
                        "description": "Two-letter US state code (e.g. CA, NY)"
                    }
                },
                "required": ["state"]
            }),
            annotations: Some(read_only.clone()),
        },
        Tool {
            name: GET_FORECAST.to_string(),
            description: "Get the weather forecast for a location in the US. Returns the next five forecast periods.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "latitude": {
                        "type": "number",
                        "description": "Latitude of the location"
                    },
                    "longitude": {
                        "type": "number",
                        "description": "Longitude of the location"
                    }
                },
                "required": ["latitude", "longitude"]
            }),
            annotations: Some(read_only),
        },
    ]
}

/// Call a tool by name
pub async fn call_tool(
    name: &str,
    arguments: Option<Value>,
    source: Arc<dyn WeatherSource>,
) -> CallToolResult {
    let args = arguments.unwrap_or(Value::Null);
    debug!("Calling tool {} with {}", name, args);

    match name {
        GET_ALERTS => handle_get_alerts(args, source).await,
        GET_FORECAST => handle_get_forecast(args, source).await,
        _ => {
            warn!("Unknown tool requested: {}", name);
            CallToolResult::error(format!("Unknown tool: {}", name))
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetAlertsArgs {
    state: String,
}

async fn handle_get_alerts(args: Value, source: Arc<dyn WeatherSource>) -> CallToolResult {
    let args: GetAlertsArgs = match serde_json::from_value(args) {
        Ok(a) => a,
        Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
    };

    CallToolResult::text(source.get_alerts(&args.state).await)
}

#[derive(Debug, Deserialize)]
struct GetForecastArgs {
    latitude: f64,
    longitude: f64,
}

async fn handle_get_forecast(args: Value, source: Arc<dyn WeatherSource>) -> CallToolResult {
    let args: GetForecastArgs = match serde_json::from_value(args) {
        Ok(a) => a,
        Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
    };

    CallToolResult::text(source.get_forecast(args.latitude, args.longitude).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mcp::protocol::ToolContent;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records calls and answers with canned text
    #[derive(Default)]
    pub(crate) struct FakeWeather {
        pub calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WeatherSource for FakeWeather {
        async fn get_alerts(&self, state: &str) -> String {
            self.calls.lock().unwrap().push(format!("alerts:{}", state));
            format!("alerts for {}", state)
        }

        async fn get_forecast(&self, latitude: f64, longitude: f64) -> String {
            self.calls
                .lock()
                .unwrap()
                .push(format!("forecast:{},{}", latitude, longitude));
            format!("forecast for {},{}", latitude, longitude)
        }
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    #[test]
    fn test_tool_definitions() {
        let tools = get_tool_definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![GET_ALERTS, GET_FORECAST]);

        assert_eq!(tools[0].input_schema["required"], json!(["state"]));
        assert_eq!(tools[1].input_schema["required"], json!(["latitude", "longitude"]));
        assert_eq!(tools[1].input_schema["properties"]["latitude"]["type"], "number");
    }

    #[tokio::test]
    async fn test_call_get_alerts() {
        let fake = Arc::new(FakeWeather::default());
        let result = call_tool(GET_ALERTS, Some(json!({ "state": "KS" })), fake.clone()).await;

        assert_eq!(result.is_error, None);
        assert_eq!(text_of(&result), "alerts for KS");
        assert_eq!(*fake.calls.lock().unwrap(), vec!["alerts:KS".to_string()]);
    }

    #[tokio::test]
    async fn test_call_get_forecast() {
        let fake = Arc::new(FakeWeather::default());
        let result = call_tool(
            GET_FORECAST,
            Some(json!({ "latitude": 38.5, "longitude": -98.25 })),
            fake,
        )
        .await;

        assert_eq!(result.is_error, None);
        assert_eq!(text_of(&result), "forecast for 38.5,-98.25");
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let fake = Arc::new(FakeWeather::default());
        let result = call_tool(GET_FORECAST, Some(json!({ "latitude": "north" })), fake.clone()).await;
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Invalid arguments"));

        let result = call_tool(GET_ALERTS, None, fake.clone()).await;
        assert_eq!(result.is_error, Some(true));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = call_tool("get_radar", None, Arc::new(FakeWeather::default())).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Unknown tool: get_radar");
    }
}
