//! Built-in defaults
//!
//! These give a working MCP server with zero configuration. Analysis still
//! needs an API key.

use crate::config::settings::{LlmSettings, NwsSettings, Settings};
use std::time::Duration;

pub const NWS_API_BASE: &str = "https://api.weather.gov";
pub const NWS_USER_AGENT: &str = concat!("wxmcp/", env!("CARGO_PKG_VERSION"));
pub const NWS_TIMEOUT_SECS: u64 = 30;
pub const MAX_FORECAST_PERIODS: usize = 5;

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const TELEMETRY_SOURCE: &str = "wxmcp";

pub fn get_default_settings() -> Settings {
    Settings {
        nws: NwsSettings {
            base_url: NWS_API_BASE.to_string(),
            user_agent: NWS_USER_AGENT.to_string(),
            timeout: Duration::from_secs(NWS_TIMEOUT_SECS),
            max_periods: MAX_FORECAST_PERIODS,
        },
        llm: LlmSettings {
            base_url: ANTHROPIC_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        },
        telemetry: None,
        log_level: None,
    }
}
