//! Text rendering of NWS alerts and forecast periods

use crate::nws::models::{AlertProperties, ForecastPeriod};
use serde_json::Value;

pub const BLOCK_SEPARATOR: &str = "\n---\n";

pub fn format_alert(props: &AlertProperties) -> String {
    format!(
        "Event: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}",
        props.event.as_deref().unwrap_or("Unknown"),
        props.area_desc.as_deref().unwrap_or("Unknown"),
        props.severity.as_deref().unwrap_or("Unknown"),
        props
            .description
            .as_deref()
            .unwrap_or("No description available"),
        props
            .instruction
            .as_deref()
            .unwrap_or("No specific instructions provided"),
    )
}

pub fn format_period(period: &ForecastPeriod) -> String {
    format!(
        "{}:\nTemperature: {}°{}\nWind: {} {}\nForecast: {}",
        period.name.as_deref().unwrap_or_default(),
        display_value(&period.temperature),
        period.temperature_unit.as_deref().unwrap_or_default(),
        display_value(&period.wind_speed),
        period.wind_direction.as_deref().unwrap_or_default(),
        period.detailed_forecast.as_deref().unwrap_or_default(),
    )
}

pub fn join_blocks<I>(blocks: I) -> String
where
    I: IntoIterator<Item = String>,
{
    blocks.into_iter().collect::<Vec<_>>().join(BLOCK_SEPARATOR)
}

/// Render a scalar or `{ "value": ... }` object as plain text
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => map.get("value").map(display_value).unwrap_or_default(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
    }
}
