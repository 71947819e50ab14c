//! Configuration loader with 3-tier precedence
//!
//! Priority order (highest to lowest):
//! 1. Environment variables (`ANTHROPIC_API_KEY`, `LAYER_BASE_URL`, ...)
//! 2. User config (`--config`, ./.wxmcp.toml, $WXMCP_CONFIG or
//!    ~/.config/wxmcp/config.toml)
//! 3. Built-in defaults

use crate::config::settings::TelemetrySettings;
use crate::config::{get_default_settings, Settings, UserConfig, TELEMETRY_SOURCE};
use crate::types::WxError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const ENV_CONFIG_PATH: &str = "WXMCP_CONFIG";
pub const ENV_NWS_BASE_URL: &str = "WXMCP_NWS_BASE_URL";
pub const ENV_USER_AGENT: &str = "WXMCP_USER_AGENT";
pub const ENV_LLM_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_LLM_MODEL: &str = "CLAUDE_MODEL_ID";
pub const ENV_TELEMETRY_BASE_URL: &str = "LAYER_BASE_URL";
pub const ENV_TELEMETRY_API_KEY: &str = "LAYER_API_KEY";

pub struct ConfigLoader {
    settings: Settings,
    source: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from the filesystem and process environment.
    ///
    /// An explicit path must exist; the other candidates are optional.
    pub fn new(explicit: Option<&Path>) -> Result<Self, WxError> {
        let user_config = Self::load_user_config(explicit)?;
        Self::from_parts(user_config, |key| std::env::var(key).ok())
    }

    /// Merge an already-parsed user config with an environment lookup
    pub fn from_parts<F>(
        user_config: Option<(PathBuf, UserConfig)>,
        env: F,
    ) -> Result<Self, WxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = get_default_settings();
        let (source, user) = match user_config {
            Some((path, config)) => (Some(path), config),
            None => (None, UserConfig::default()),
        };

        if let Some(general) = user.settings {
            settings.log_level = general.log_level;
        }

        if let Some(nws) = user.nws {
            if let Some(base_url) = nws.base_url {
                settings.nws.base_url = base_url;
            }
            if let Some(user_agent) = nws.user_agent {
                settings.nws.user_agent = user_agent;
            }
            if let Some(secs) = nws.timeout_secs {
                settings.nws.timeout = Duration::from_secs(secs);
            }
            if let Some(max_periods) = nws.max_periods {
                settings.nws.max_periods = max_periods;
            }
        }

        if let Some(llm) = user.llm {
            if let Some(base_url) = llm.base_url {
                settings.llm.base_url = base_url;
            }
            settings.llm.api_key = llm.api_key.or(settings.llm.api_key);
            if let Some(model) = llm.model {
                settings.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                settings.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                settings.llm.temperature = temperature;
            }
        }

        let mut telemetry = user.telemetry.unwrap_or_default();

        // Environment wins over the file
        if let Some(base_url) = env(ENV_NWS_BASE_URL) {
            settings.nws.base_url = base_url;
        }
        if let Some(user_agent) = env(ENV_USER_AGENT) {
            settings.nws.user_agent = user_agent;
        }
        if let Some(api_key) = env(ENV_LLM_API_KEY) {
            settings.llm.api_key = Some(api_key);
        }
        if let Some(model) = env(ENV_LLM_MODEL).filter(|m| !m.trim().is_empty()) {
            settings.llm.model = model;
        }
        if let Some(base_url) = env(ENV_TELEMETRY_BASE_URL) {
            telemetry.base_url = Some(base_url);
        }
        if let Some(api_key) = env(ENV_TELEMETRY_API_KEY) {
            telemetry.api_key = Some(api_key);
        }

        settings.telemetry = telemetry.base_url.map(|base_url| TelemetrySettings {
            base_url,
            api_key: telemetry.api_key,
            source: telemetry
                .source
                .unwrap_or_else(|| TELEMETRY_SOURCE.to_string()),
            user_id: telemetry.user_id,
        });

        Self::validate(&mut settings)?;

        Ok(Self { settings, source })
    }

    fn validate(settings: &mut Settings) -> Result<(), WxError> {
        settings.nws.base_url = normalize_base_url("nws.base_url", &settings.nws.base_url)?;
        settings.llm.base_url = normalize_base_url("llm.base_url", &settings.llm.base_url)?;
        if let Some(telemetry) = settings.telemetry.as_mut() {
            telemetry.base_url = normalize_base_url("telemetry.base_url", &telemetry.base_url)?;
        }

        if settings.nws.max_periods == 0 {
            return Err(WxError::ConfigError(
                "nws.max_periods must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&settings.llm.temperature) {
            return Err(WxError::ConfigError(format!(
                "llm.temperature must be between 0 and 1, got {}",
                settings.llm.temperature
            )));
        }

        Ok(())
    }

    fn load_user_config(explicit: Option<&Path>) -> Result<Option<(PathBuf, UserConfig)>, WxError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(WxError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::read_config(path).map(|config| Some((path.to_path_buf(), config)));
        }

        // Try multiple locations in priority order:
        // 1. ./.wxmcp.toml (project-specific)
        // 2. $WXMCP_CONFIG (environment variable)
        // 3. ~/.config/wxmcp/config.toml (user-global)

        let mut candidates = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(".wxmcp.toml"));
        }

        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            candidates.push(PathBuf::from(config_path));
        }

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("wxmcp").join("config.toml"));
        }

        for path in &candidates {
            if path.exists() {
                let config = Self::read_config(path)?;
                return Ok(Some((path.clone(), config)));
            }
        }

        debug!("No user config file found");
        Ok(None)
    }

    /// Parse a single TOML config file
    pub fn read_config(path: &Path) -> Result<UserConfig, WxError> {
        debug!("Loading user config from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| WxError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: UserConfig = toml::from_str(&content)
            .map_err(|e| WxError::ConfigError(format!("Failed to parse config: {}", e)))?;

        info!("Loaded user configuration from {}", path.display());
        Ok(config)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Path of the user config file that was applied, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Validate a base URL and strip any trailing slash
fn normalize_base_url(field: &str, raw: &str) -> Result<String, WxError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| WxError::ConfigError(format!("Invalid {} '{}': {}", field, raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(WxError::ConfigError(format!(
            "Invalid {} '{}': unsupported scheme '{}'",
            field, raw, other
        ))),
    }
}
