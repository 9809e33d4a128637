use crate::types::weather_condition::WeatherCondition;
use serde::{Deserialize, Serialize};

/// One day of weather at one location, as attached to an enriched record.
///
/// Field names are the persisted names. Every measurement may be `null`
/// when the archive has a code for the day but no value for that metric.
/// Older datasets may also carry a `null` code with the `"Unknown"` label.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub condition: String,                // label derived from weather_code
    pub weather_code: Option<i64>,        // WMO code
    pub temperature_max: Option<f64>,     // °C
    pub temperature_min: Option<f64>,     // °C
    pub temperature_mean: Option<f64>,    // °C
    pub precipitation_mm: Option<f64>,    // mm
    pub rain_mm: Option<f64>,             // mm
    pub snowfall_cm: Option<f64>,         // cm
    pub wind_speed_max_kmh: Option<f64>,  // km/h
    pub wind_gusts_max_kmh: Option<f64>,  // km/h
    pub wind_direction_deg: Option<f64>,  // dominant direction, degrees
}

impl WeatherObservation {
    /// Builds an observation with the condition label derived from `weather_code`
    /// and every measurement unset.
    pub fn from_code(weather_code: i64) -> Self {
        Self {
            condition: WeatherCondition::label_for_code(weather_code).to_string(),
            weather_code: Some(weather_code),
            temperature_max: None,
            temperature_min: None,
            temperature_mean: None,
            precipitation_mm: None,
            rain_mm: None,
            snowfall_cm: None,
            wind_speed_max_kmh: None,
            wind_gusts_max_kmh: None,
            wind_direction_deg: None,
        }
    }

    pub fn weather_condition(&self) -> Option<WeatherCondition> {
        self.weather_code.and_then(WeatherCondition::from_code)
    }
}

/// Outcome of one lookup that reached the archive.
///
/// `NoData` is the explicit "archive answered, but has nothing for this
/// day/location" state. It is distinct from a record that was never looked up.
#[derive(Debug, PartialEq, Clone)]
pub enum FetchOutcome {
    Observed(WeatherObservation),
    NoData,
}

impl FetchOutcome {
    pub fn is_observed(&self) -> bool {
        matches!(self, FetchOutcome::Observed(_))
    }

    pub fn observation(&self) -> Option<&WeatherObservation> {
        match self {
            FetchOutcome::Observed(observation) => Some(observation),
            FetchOutcome::NoData => None,
        }
    }

    pub fn into_observation(self) -> Option<WeatherObservation> {
        match self {
            FetchOutcome::Observed(observation) => Some(observation),
            FetchOutcome::NoData => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_field_names() {
        let mut observation = WeatherObservation::from_code(3);
        observation.temperature_max = Some(21.4);
        observation.wind_direction_deg = Some(270.0);

        let json = serde_json::to_value(&observation).unwrap();
        assert_eq!(json["condition"], "Overcast");
        assert_eq!(json["weather_code"], 3);
        assert_eq!(json["temperature_max"], 21.4);
        assert!(json["snowfall_cm"].is_null());
        assert_eq!(json["wind_direction_deg"], 270.0);

        let back: WeatherObservation = serde_json::from_value(json).unwrap();
        assert_eq!(back, observation);
    }

    #[test]
    fn test_null_code_is_accepted() {
        let json = serde_json::json!({
            "condition": "Unknown",
            "weather_code": null,
            "temperature_max": 4.5,
            "temperature_min": null,
            "temperature_mean": null,
            "precipitation_mm": null,
            "rain_mm": null,
            "snowfall_cm": null,
            "wind_speed_max_kmh": null,
            "wind_gusts_max_kmh": null,
            "wind_direction_deg": null
        });

        let observation: WeatherObservation = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(observation.weather_code, None);
        assert_eq!(observation.weather_condition(), None);
        assert_eq!(observation.temperature_max, Some(4.5));
        assert_eq!(serde_json::to_value(&observation).unwrap(), json);
    }

    #[test]
    fn test_outcome_accessors() {
        let observed = FetchOutcome::Observed(WeatherObservation::from_code(0));
        assert!(observed.is_observed());
        assert_eq!(observed.observation().and_then(|o| o.weather_code), Some(0));
        assert!(!FetchOutcome::NoData.is_observed());
        assert_eq!(FetchOutcome::NoData.into_observation(), None);
    }
}
