//! National Weather Service lookups

pub mod client;
pub mod format;
pub mod models;

pub use client::NwsClient;

use async_trait::async_trait;

/// Source of the two weather texts exposed as tools.
///
/// Implementations never fail: errors are rendered into the returned text.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Active alerts for a two-letter US state code
    async fn get_alerts(&self, state: &str) -> String;

    /// The next forecast periods for a coordinate
    async fn get_forecast(&self, latitude: f64, longitude: f64) -> String;
}
