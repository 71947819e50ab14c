//! Telemetry session payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What a session action records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CompletionPrompt,
    CompletionOutput,
}

/// One timestamped entry in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAction {
    pub kind: ActionKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scanners: Vec<Scanner>,
}

impl SessionAction {
    pub fn new(kind: ActionKind, start_time: DateTime<Utc>) -> Self {
        Self {
            kind,
            start_time,
            end_time: Utc::now(),
            attributes: Map::new(),
            data: Value::Null,
            error: None,
            scanners: Vec::new(),
        }
    }

    pub fn attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Record a single chat message as the action's data
    pub fn message(mut self, role: &str, content: impl Into<String>) -> Self {
        self.data = serde_json::json!({
            "messages": [{ "role": role, "content": content.into() }]
        });
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(ActionError {
            message: message.into(),
        });
        self
    }

    pub fn scanner(mut self, scanner: Scanner) -> Self {
        self.scanners.push(scanner);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionError {
    pub message: String,
}

/// Auxiliary data attached to an action, e.g. token usage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scanner {
    pub name: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirewallLookupResponse {
    pub decision: String,
}

/// Verdict of the telemetry-side firewall for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallDecision {
    Block,
    Alert,
    Pass,
}

impl FirewallDecision {
    /// Anything other than block/alert passes
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "block" => Self::Block,
            "alert" => Self::Alert,
            _ => Self::Pass,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Alert => "alert",
            Self::Pass => "pass",
        }
    }
}

impl fmt::Display for FirewallDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firewall_decision_parse() {
        assert_eq!(FirewallDecision::parse("BLOCK"), FirewallDecision::Block);
        assert_eq!(FirewallDecision::parse(" alert "), FirewallDecision::Alert);
        assert_eq!(FirewallDecision::parse("pass"), FirewallDecision::Pass);
        assert_eq!(FirewallDecision::parse("unknown"), FirewallDecision::Pass);
    }

    #[test]
    fn test_action_serialization() {
        let action = SessionAction::new(ActionKind::CompletionOutput, Utc::now())
            .attribute("model.id", "claude-test")
            .message("assistant", "hello");

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["kind"], "completion_output");
        assert_eq!(value["attributes"]["model.id"], "claude-test");
        assert_eq!(value["data"]["messages"][0]["role"], "assistant");
        assert!(value.get("error").is_none());
        assert!(value.get("scanners").is_none());
    }

    #[test]
    fn test_create_session_body_carries_attributes_only() {
        let mut attributes = Map::new();
        attributes.insert("source".to_string(), Value::from("wxmcp"));

        let value = serde_json::to_value(CreateSessionRequest { attributes }).unwrap();
        assert_eq!(value, serde_json::json!({ "attributes": { "source": "wxmcp" } }));
    }
}
