//! NWS API response shapes
//!
//! Only the fields the tools render are modelled. Everything is optional so
//! that a sparse feature degrades to placeholders instead of a decode error.

use serde::Deserialize;
use serde_json::Value;

/// `GET /alerts/active/area/{state}`
#[derive(Debug, Deserialize)]
pub struct AlertCollection {
    pub features: Option<Vec<AlertFeature>>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    #[serde(default)]
    pub properties: AlertProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    pub event: Option<String>,
    pub area_desc: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
}

/// `GET /points/{lat},{lon}`
#[derive(Debug, Deserialize)]
pub struct PointResponse {
    pub properties: PointProperties,
}

#[derive(Debug, Deserialize)]
pub struct PointProperties {
    pub forecast: Option<String>,
}

/// The forecast document linked from a point
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastPeriod {
    pub name: Option<String>,
    /// Plain number, or a quantitative value object when the API is asked
    /// for one
    pub temperature: Value,
    pub temperature_unit: Option<String>,
    pub wind_speed: Value,
    pub wind_direction: Option<String>,
    pub detailed_forecast: Option<String>,
}
