//! Weather analysis pipeline
//!
//! Fetches the two weather texts, asks the model for a narrative and, when a
//! telemetry client is attached, records the exchange. Telemetry is best
//! effort: its failures are logged and never change the analysis result.

use crate::analysis::llm::{ChatModel, ChatRequest, ChatResponse};
use crate::analysis::perspective::{build_prompt, Perspective};
use crate::mcp::tools::{GET_ALERTS, GET_FORECAST};
use crate::nws::WeatherSource;
use crate::telemetry::{ActionKind, FirewallDecision, Scanner, SessionAction, TelemetryClient};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const BLOCKED_RESPONSE: &str = "Sorry, I can't respond to this request.";
pub const ERROR_RESPONSE: &str = "Sorry, I can't respond to this request due to an error.";
pub const EMPTY_RESPONSE: &str =
    "Sorry, I can't respond to this request due to an empty response.";

/// Longest tool output recorded in a telemetry action, in characters
const TOOL_LOG_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub perspective: Perspective,
    /// Existing telemetry session to append to
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub alerts: String,
    pub forecast: String,
    pub prompt: String,
    pub response: String,
    pub session_id: Option<String>,
    pub firewall: FirewallDecision,
}

struct Timed {
    text: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

async fn timed<F>(fut: F) -> Timed
where
    F: Future<Output = String>,
{
    let start = Utc::now();
    let text = fut.await;
    Timed {
        text,
        start,
        end: Utc::now(),
    }
}

pub struct WeatherAnalyzer {
    weather: Arc<dyn WeatherSource>,
    model: Arc<dyn ChatModel>,
    telemetry: Option<TelemetryClient>,
}

impl WeatherAnalyzer {
    pub fn new(weather: Arc<dyn WeatherSource>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            weather,
            model,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryClient) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisReport {
        info!(
            "Analyzing weather for {} ({}, {}) from the {} perspective",
            request.state, request.latitude, request.longitude, request.perspective
        );

        let session_id = self.open_session(request).await;
        let session = session_id.as_deref();

        let (alerts, forecast) = tokio::join!(
            timed(self.weather.get_alerts(&request.state)),
            timed(self.weather.get_forecast(request.latitude, request.longitude)),
        );

        self.record_tool(session, GET_ALERTS, &alerts).await;
        self.record_tool(session, GET_FORECAST, &forecast).await;

        let prompt = build_prompt(
            request.perspective,
            &request.state,
            request.latitude,
            request.longitude,
            &alerts.text,
            &forecast.text,
        );

        let mut report = AnalysisReport {
            alerts: alerts.text,
            forecast: forecast.text,
            prompt,
            response: String::new(),
            session_id: session_id.clone(),
            firewall: FirewallDecision::Pass,
        };

        report.firewall = self.check_firewall(session).await;
        if report.firewall == FirewallDecision::Block {
            warn!("Firewall blocked the request before the model call");
            let action = self
                .base_action(ActionKind::CompletionOutput, Utc::now())
                .attribute("firewall.decision", report.firewall.as_str())
                .message("assistant", BLOCKED_RESPONSE);
            self.record(session, action).await;
            report.response = BLOCKED_RESPONSE.to_string();
            return report;
        }

        let start = Utc::now();
        let prompt_action = self
            .base_action(ActionKind::CompletionPrompt, start)
            .attribute("model.stream", false)
            .attribute("model.max_tokens", self.model.max_tokens())
            .attribute("model.temperature", f64::from(self.model.temperature()))
            .attribute("perspective", request.perspective.as_str())
            .message("user", report.prompt.clone());
        self.record(session, prompt_action).await;

        let chat_request = ChatRequest {
            prompt: report.prompt.clone(),
            headers: self.session_headers(session),
        };

        let output_action = match self.model.complete(&chat_request).await {
            Ok(ChatResponse { text, usage }) => {
                let mut action = self.base_action(ActionKind::CompletionOutput, start);
                if let Some(usage) = usage {
                    action = action.scanner(Scanner {
                        name: "usage".to_string(),
                        data: json!({
                            "input_tokens": usage.input_tokens,
                            "output_tokens": usage.output_tokens,
                            "total_tokens": usage.total(),
                        }),
                    });
                }

                if text.is_empty() {
                    error!("Empty response from the model");
                    report.response = EMPTY_RESPONSE.to_string();
                    action.error("empty response")
                } else {
                    report.response = text;
                    action.message("assistant", report.response.clone())
                }
            }
            Err(e) => {
                error!("Model call failed: {}", e);
                report.response = ERROR_RESPONSE.to_string();
                self.base_action(ActionKind::CompletionOutput, start)
                    .error(e.to_string())
            }
        };
        self.record(session, output_action).await;

        report.firewall = self.check_firewall(session).await;
        if report.firewall == FirewallDecision::Block {
            warn!("Firewall blocked the response after the model call");
            report.response = BLOCKED_RESPONSE.to_string();
        }

        report
    }

    /// Reuse the caller's session or create one; `None` disables logging
    async fn open_session(&self, request: &AnalysisRequest) -> Option<String> {
        let telemetry = self.telemetry.as_ref()?;

        if let Some(id) = &request.session_id {
            return Some(id.clone());
        }

        let mut attributes = Map::new();
        attributes.insert("source".to_string(), Value::from(telemetry.source()));
        attributes.insert("model.id".to_string(), Value::from(self.model.model_id()));
        attributes.insert(
            "perspective".to_string(),
            Value::from(request.perspective.as_str()),
        );

        match telemetry.create_session(attributes).await {
            Ok(id) => {
                info!("Created telemetry session {}", id);
                Some(id)
            }
            Err(e) => {
                error!("Error creating telemetry session: {}", e);
                None
            }
        }
    }

    async fn check_firewall(&self, session: Option<&str>) -> FirewallDecision {
        let (Some(telemetry), Some(session)) = (self.telemetry.as_ref(), session) else {
            return FirewallDecision::Pass;
        };

        match telemetry.firewall_lookup(session).await {
            Ok(FirewallDecision::Alert) => {
                warn!("Firewall raised an alert for session {}", session);
                FirewallDecision::Alert
            }
            Ok(decision) => {
                info!("Firewall decision for session {}: {}", session, decision);
                decision
            }
            Err(e) => {
                error!("Firewall check error: {}", e);
                FirewallDecision::Pass
            }
        }
    }

    fn base_action(&self, kind: ActionKind, start: DateTime<Utc>) -> SessionAction {
        let source = self
            .telemetry
            .as_ref()
            .map(|t| t.source().to_string())
            .unwrap_or_default();

        SessionAction::new(kind, start)
            .attribute("model.id", self.model.model_id())
            .attribute("source", source)
    }

    async fn record_tool(&self, session: Option<&str>, tool: &str, output: &Timed) {
        let mut action = self
            .base_action(ActionKind::CompletionOutput, output.start)
            .attribute("tool.name", tool)
            .message(
                "assistant",
                output.text.chars().take(TOOL_LOG_LIMIT).collect::<String>(),
            );
        action.end_time = output.end;
        self.record(session, action).await;
    }

    async fn record(&self, session: Option<&str>, action: SessionAction) {
        let (Some(telemetry), Some(session)) = (self.telemetry.as_ref(), session) else {
            return;
        };

        if let Err(e) = telemetry.append_action(session, &action).await {
            error!("Error logging {:?} action: {}", action.kind, e);
        }
    }

    fn session_headers(&self, session: Option<&str>) -> Vec<(String, String)> {
        let (Some(telemetry), Some(session)) = (self.telemetry.as_ref(), session) else {
            return Vec::new();
        };

        let mut headers = vec![("X-Layer-Session-Id".to_string(), session.to_string())];
        if let Some(user_id) = telemetry.user_id() {
            headers.push(("Layer-User-Id".to_string(), user_id.to_string()));
        }
        headers.push(("Layer-Source".to_string(), telemetry.source().to_string()));
        headers
    }
}
