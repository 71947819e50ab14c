//! WXMCP - National Weather Service tools for Model Context Protocol
//!
//! This crate exposes two read-only NWS lookups (active alerts by state and
//! the forecast for a coordinate) as MCP tools over stdio, and can feed the
//! same data to an LLM for a narrative analysis with optional session
//! telemetry.

pub mod analysis;
pub mod config;
pub mod mcp;
pub mod nws;
pub mod telemetry;
pub mod types;

pub use analysis::{AnalysisReport, AnalysisRequest, Perspective, WeatherAnalyzer};
pub use config::ConfigLoader;
pub use mcp::McpServer;
pub use nws::{NwsClient, WeatherSource};
pub use telemetry::TelemetryClient;
pub use types::WxError;
