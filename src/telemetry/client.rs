//! HTTP client for the session telemetry service
//!
//! Every call is a single request. There is no retry and no buffering;
//! callers decide whether a failure matters.

use crate::config::TelemetrySettings;
use crate::telemetry::types::{
    CreateSessionRequest, CreateSessionResponse, FirewallDecision, FirewallLookupResponse,
    SessionAction,
};
use crate::types::{Result, WxError};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

const TELEMETRY_TIMEOUT_SECS: u64 = 10;

pub struct TelemetryClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    source: String,
    user_id: Option<String>,
}

impl TelemetryClient {
    pub fn new(settings: &TelemetrySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TELEMETRY_TIMEOUT_SECS))
            .build()?;

        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            WxError::ConfigError(format!("Invalid telemetry base URL: {}", e))
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
            source: settings.source.clone(),
            user_id: settings.user_id.clone(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Create a session and return its id
    pub async fn create_session(&self, attributes: Map<String, Value>) -> Result<String> {
        let url = self.endpoint(&["v1", "sessions"])?;
        let body = CreateSessionRequest { attributes };

        let response = self.request(Method::POST, url).json(&body).send().await?;
        let response = Self::check(response).await?;
        let created: CreateSessionResponse = response.json().await?;

        tracing::debug!("Created telemetry session {}", created.session_id);
        Ok(created.session_id)
    }

    /// Append one action to an existing session
    pub async fn append_action(&self, session_id: &str, action: &SessionAction) -> Result<()> {
        let url = self.endpoint(&["v1", "sessions", session_id, "actions"])?;

        let response = self.request(Method::POST, url).json(action).send().await?;
        Self::check(response).await?;

        tracing::debug!(
            "Appended {:?} action to session {}",
            action.kind,
            session_id
        );
        Ok(())
    }

    /// Ask the firewall for its verdict on a session
    pub async fn firewall_lookup(&self, session_id: &str) -> Result<FirewallDecision> {
        let url = self.endpoint(&["v1", "firewall", "sessions", session_id])?;

        let response = self.request(Method::GET, url).send().await?;
        let response = Self::check(response).await?;
        let lookup: FirewallLookupResponse = response.json().await?;

        Ok(FirewallDecision::parse(&lookup.decision))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WxError::Telemetry("telemetry base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() || status == StatusCode::ACCEPTED {
            tracing::debug!("Telemetry request successful: {}", status);
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());

        tracing::error!(
            "Telemetry request failed: status={}, body={}",
            status,
            body
        );

        Err(WxError::Status {
            service: "telemetry",
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::types::ActionKind;
    use chrono::Utc;
    use mockito::Matcher;
    use serde_json::json;

    fn settings(base_url: String) -> TelemetrySettings {
        TelemetrySettings {
            base_url,
            api_key: Some("layer-key".to_string()),
            source: "wxmcp-test".to_string(),
            user_id: None,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = TelemetryClient::new(&settings("https://telemetry.example.com".to_string()));
        assert!(client.is_ok());

        let client = TelemetryClient::new(&settings("not a url".to_string()));
        assert!(client.is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client =
            TelemetryClient::new(&settings("https://telemetry.example.com/api/".to_string()))
                .unwrap();
        let url = client.endpoint(&["v1", "sessions", "a b", "actions"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://telemetry.example.com/api/v1/sessions/a%20b/actions"
        );
    }

    #[tokio::test]
    async fn test_create_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/sessions")
            .match_header("authorization", "Bearer layer-key")
            .match_body(Matcher::PartialJson(json!({
                "attributes": { "source": "wxmcp-test" }
            })))
            .with_status(201)
            .with_body(r#"{"session_id": "sess-1"}"#)
            .create_async()
            .await;

        let client = TelemetryClient::new(&settings(server.url())).unwrap();
        let mut attributes = Map::new();
        attributes.insert("source".to_string(), json!("wxmcp-test"));

        let id = client.create_session(attributes).await.unwrap();
        assert_eq!(id, "sess-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_append_action() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/sessions/sess-1/actions")
            .match_body(Matcher::PartialJson(json!({
                "kind": "completion_prompt",
                "data": { "messages": [{ "role": "user", "content": "hi" }] }
            })))
            .with_status(202)
            .create_async()
            .await;

        let client = TelemetryClient::new(&settings(server.url())).unwrap();
        let action = SessionAction::new(ActionKind::CompletionPrompt, Utc::now()).message("user", "hi");

        client.append_action("sess-1", &action).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_append_action_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/sessions/gone/actions")
            .with_status(404)
            .with_body("no such session")
            .create_async()
            .await;

        let client = TelemetryClient::new(&settings(server.url())).unwrap();
        let action = SessionAction::new(ActionKind::CompletionOutput, Utc::now());

        let err = client.append_action("gone", &action).await.unwrap_err();
        assert!(matches!(err, WxError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_firewall_lookup() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/firewall/sessions/sess-9")
            .with_status(200)
            .with_body(r#"{"decision": "BLOCK"}"#)
            .create_async()
            .await;

        let client = TelemetryClient::new(&settings(server.url())).unwrap();
        let decision = client.firewall_lookup("sess-9").await.unwrap();
        assert_eq!(decision, FirewallDecision::Block);
    }
}
