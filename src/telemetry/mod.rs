//! Optional session telemetry for analysis runs

pub mod client;
pub mod types;

pub use client::TelemetryClient;
pub use types::{ActionKind, FirewallDecision, Scanner, SessionAction};
