//! Configuration system for WXMCP
//!
//! Provides a 3-tier configuration hierarchy:
//! 1. Environment variables (highest priority)
//! 2. User config file
//! 3. Built-in defaults (lowest priority)

mod defaults;
mod loader;
mod settings;
mod user_config;

pub use defaults::*;
pub use loader::ConfigLoader;
pub use settings::{LlmSettings, NwsSettings, Settings, TelemetrySettings};
pub use user_config::UserConfig;
