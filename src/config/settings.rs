//! Resolved runtime settings

use std::time::Duration;

/// Fully resolved configuration after defaults, user file and environment
/// have been merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub nws: NwsSettings,
    pub llm: LlmSettings,
    /// `None` when no telemetry endpoint is configured
    pub telemetry: Option<TelemetrySettings>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NwsSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_periods: usize,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub source: String,
    pub user_id: Option<String>,
}
