//! Perspective-specific prompt construction

use clap::ValueEnum;
use std::fmt;

/// Framing of the analysis requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Perspective {
    #[default]
    General,
    Travel,
    Emergency,
}

impl Perspective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Travel => "travel",
            Self::Emergency => "emergency",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Self::General => {
                "You are a meteorologist. Using the National Weather Service data below, \
                 summarize current conditions and the outlook for the coming days in plain language. \
                 Mention any active alerts and what they mean for residents."
            }
            Self::Travel => {
                "You are a travel advisor. Using the National Weather Service data below, \
                 explain how the weather will affect travel in this area: road and driving conditions, \
                 likely flight disruptions, good and bad days for outdoor plans, and what to pack."
            }
            Self::Emergency => {
                "You are an emergency management officer. Using the National Weather Service data below, \
                 assess risks to life and property, rank the active alerts by urgency, \
                 and list concrete protective actions people in the area should take now."
            }
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the single user message sent to the model
pub fn build_prompt(
    perspective: Perspective,
    state: &str,
    latitude: f64,
    longitude: f64,
    alerts: &str,
    forecast: &str,
) -> String {
    format!(
        "{}\n\nLocation: {} ({}, {})\n\nActive alerts:\n{}\n\nForecast:\n{}",
        perspective.instruction(),
        state.trim().to_uppercase(),
        latitude,
        longitude,
        alerts,
        forecast,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_weather_text() {
        let prompt = build_prompt(
            Perspective::Travel,
            "co",
            39.74,
            -104.99,
            "Event: Winter Storm Warning",
            "Tonight:\nTemperature: 12°F",
        );

        assert!(prompt.starts_with("You are a travel advisor."));
        assert!(prompt.contains("Location: CO (39.74, -104.99)"));
        assert!(prompt.contains("Active alerts:\nEvent: Winter Storm Warning"));
        assert!(prompt.ends_with("Forecast:\nTonight:\nTemperature: 12°F"));
    }

    #[test]
    fn test_perspectives_differ() {
        let general = build_prompt(Perspective::General, "CA", 0.0, 0.0, "a", "f");
        let emergency = build_prompt(Perspective::Emergency, "CA", 0.0, 0.0, "a", "f");
        assert_ne!(general, emergency);
        assert!(emergency.contains("protective actions"));
    }

    #[test]
    fn test_value_enum_names() {
        assert_eq!(
            Perspective::from_str("emergency", true).unwrap(),
            Perspective::Emergency
        );
        assert_eq!(Perspective::default().to_string(), "general");
    }
}
