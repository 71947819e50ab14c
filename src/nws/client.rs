//! NWS HTTP client
//!
//! Two read-only lookups, each rendered to text. Failures never escape:
//! they are logged and replaced by a fixed message.

use crate::config::NwsSettings;
use crate::nws::format::{format_alert, format_period, join_blocks};
use crate::nws::models::{AlertCollection, AlertFeature, ForecastResponse, PointResponse};
use crate::nws::WeatherSource;
use crate::types::{Result, WxError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

pub const ALERTS_UNAVAILABLE: &str = "Unable to fetch alerts or no alerts found.";
pub const NO_ACTIVE_ALERTS: &str = "No active alerts for this state.";
pub const POINT_UNAVAILABLE: &str = "Unable to fetch forecast data for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Unable to fetch detailed forecast.";
pub const NO_FORECAST_PERIODS: &str = "No forecast periods available.";

const GEO_JSON: &str = "application/geo+json";

pub struct NwsClient {
    http: reqwest::Client,
    base_url: Url,
    max_periods: usize,
}

impl NwsClient {
    pub fn new(settings: &NwsSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GEO_JSON));

        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| WxError::ConfigError(format!("Invalid NWS base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(WxError::ConfigError(format!(
                "NWS base URL cannot carry a path: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            max_periods: settings.max_periods,
        })
    }

    /// Base URL plus path segments, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET a URL and decode the JSON body
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("NWS request: {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(WxError::Status {
                service: "NWS",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// Active alert features for a state; `None` when the body has no
    /// `features` member
    pub async fn fetch_alerts(&self, state: &str) -> Result<Option<Vec<AlertFeature>>> {
        let state = state.trim().to_uppercase();
        let url = self.endpoint(&["alerts", "active", "area", &state]);
        let collection: AlertCollection = self.fetch_json(url.as_str()).await?;
        Ok(collection.features)
    }

    /// Resolve a coordinate to its forecast URL
    pub async fn fetch_forecast_url(&self, latitude: f64, longitude: f64) -> Result<String> {
        let point = format!("{},{}", latitude, longitude);
        let url = self.endpoint(&["points", &point]);
        let point: PointResponse = self.fetch_json(url.as_str()).await?;
        point
            .properties
            .forecast
            .ok_or(WxError::MissingField("properties.forecast"))
    }

    pub async fn fetch_forecast(&self, forecast_url: &str) -> Result<ForecastResponse> {
        self.fetch_json(forecast_url).await
    }
}

#[async_trait]
impl WeatherSource for NwsClient {
    async fn get_alerts(&self, state: &str) -> String {
        info!("Fetching active alerts for {}", state);

        match self.fetch_alerts(state).await {
            Ok(Some(features)) if features.is_empty() => NO_ACTIVE_ALERTS.to_string(),
            Ok(Some(features)) => {
                join_blocks(features.iter().map(|f| format_alert(&f.properties)))
            }
            Ok(None) => {
                warn!("Alert response for {} has no features member", state);
                ALERTS_UNAVAILABLE.to_string()
            }
            Err(e) => {
                warn!("Failed to fetch alerts for {}: {}", state, e);
                ALERTS_UNAVAILABLE.to_string()
            }
        }
    }

    async fn get_forecast(&self, latitude: f64, longitude: f64) -> String {
        info!("Fetching forecast for {},{}", latitude, longitude);

        let forecast_url = match self.fetch_forecast_url(latitude, longitude).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed to resolve point {},{}: {}", latitude, longitude, e);
                return POINT_UNAVAILABLE.to_string();
            }
        };

        let forecast = match self.fetch_forecast(&forecast_url).await {
            Ok(forecast) => forecast,
            Err(e) => {
                warn!("Failed to fetch forecast from {}: {}", forecast_url, e);
                return FORECAST_UNAVAILABLE.to_string();
            }
        };

        if forecast.properties.periods.is_empty() {
            return NO_FORECAST_PERIODS.to_string();
        }

        join_blocks(
            forecast
                .properties
                .periods
                .iter()
                .take(self.max_periods)
                .map(format_period),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::get_default_settings;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> NwsClient {
        let mut settings = get_default_settings().nws;
        settings.base_url = server.url();
        NwsClient::new(&settings).unwrap()
    }

    fn period(name: &str, temperature: i64) -> serde_json::Value {
        json!({
            "name": name,
            "temperature": temperature,
            "temperatureUnit": "F",
            "windSpeed": "10 mph",
            "windDirection": "SW",
            "detailedForecast": format!("{} forecast.", name)
        })
    }

    #[tokio::test]
    async fn test_alerts_formats_features() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/alerts/active/area/TX")
            .match_header("accept", GEO_JSON)
            .match_header("user-agent", mockito::Matcher::Regex("^wxmcp/".to_string()))
            .with_status(200)
            .with_header("content-type", GEO_JSON)
            .with_body(
                json!({
                    "features": [
                        { "properties": { "event": "Heat Advisory", "areaDesc": "Bexar", "severity": "Moderate" } },
                        { "properties": { "event": "Flood Watch", "instruction": "Avoid low water crossings." } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let text = client.get_alerts(" tx ").await;

        mock.assert_async().await;
        let blocks: Vec<&str> = text.split("\n---\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Event: Heat Advisory\nArea: Bexar\nSeverity: Moderate"));
        assert!(blocks[0].ends_with("Instructions: No specific instructions provided"));
        assert!(blocks[1].contains("Area: Unknown"));
        assert!(blocks[1].ends_with("Instructions: Avoid low water crossings."));
    }

    #[tokio::test]
    async fn test_alerts_empty_features() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/alerts/active/area/VT")
            .with_status(200)
            .with_body(r#"{"features": []}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_alerts("VT").await, NO_ACTIVE_ALERTS);
    }

    #[tokio::test]
    async fn test_alerts_missing_features_member() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/alerts/active/area/CA")
            .with_status(200)
            .with_body(r#"{"type": "FeatureCollection"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_alerts("CA").await, ALERTS_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_alerts_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/alerts/active/area/ZZ")
            .with_status(400)
            .with_body(r#"{"title": "Bad Request"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_alerts("zz").await, ALERTS_UNAVAILABLE);

        let err = client.fetch_alerts("ZZ").await.unwrap_err();
        assert!(matches!(err, WxError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_alerts_state_is_one_path_segment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/alerts/active/area/CA%3FX=1%2FY")
            .with_status(200)
            .with_body(r#"{"features": []}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let url = client.endpoint(&["alerts", "active", "area", "CA?X=1/Y"]);
        assert!(url.query().is_none());

        assert_eq!(client.get_alerts("ca?x=1/y").await, NO_ACTIVE_ALERTS);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forecast_takes_first_five_periods() {
        let mut server = mockito::Server::new_async().await;
        let forecast_url = format!("{}/gridpoints/EWX/156,91/forecast", server.url());

        server
            .mock("GET", "/points/29.42,-98.49")
            .with_status(200)
            .with_body(json!({ "properties": { "forecast": forecast_url } }).to_string())
            .create_async()
            .await;

        let periods: Vec<_> = (0..7).map(|i| period(&format!("Period {}", i), 60 + i)).collect();
        server
            .mock("GET", "/gridpoints/EWX/156,91/forecast")
            .with_status(200)
            .with_body(json!({ "properties": { "periods": periods } }).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let text = client.get_forecast(29.42, -98.49).await;

        let blocks: Vec<&str> = text.split("\n---\n").collect();
        assert_eq!(blocks.len(), 5);
        assert_eq!(
            blocks[0],
            "Period 0:\nTemperature: 60°F\nWind: 10 mph SW\nForecast: Period 0 forecast."
        );
        assert!(blocks[4].starts_with("Period 4:"));
        assert!(!text.contains("Period 5"));
    }

    #[tokio::test]
    async fn test_forecast_point_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/points/0,0")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_forecast(0.0, 0.0).await, POINT_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_forecast_point_without_forecast_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/points/10,20")
            .with_status(200)
            .with_body(r#"{"properties": {}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_forecast(10.0, 20.0).await, POINT_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_forecast_second_stage_failure() {
        let mut server = mockito::Server::new_async().await;
        let forecast_url = format!("{}/gridpoints/TOP/31,80/forecast", server.url());

        server
            .mock("GET", "/points/39.1,-95.6")
            .with_status(200)
            .with_body(json!({ "properties": { "forecast": forecast_url } }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/gridpoints/TOP/31,80/forecast")
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_forecast(39.1, -95.6).await, FORECAST_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_forecast_without_periods() {
        let mut server = mockito::Server::new_async().await;
        let forecast_url = format!("{}/gridpoints/X/1,1/forecast", server.url());

        server
            .mock("GET", "/points/1.5,2.5")
            .with_status(200)
            .with_body(json!({ "properties": { "forecast": forecast_url } }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/gridpoints/X/1,1/forecast")
            .with_status(200)
            .with_body(r#"{"properties": {"periods": []}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_forecast(1.5, 2.5).await, NO_FORECAST_PERIODS);
    }
}
