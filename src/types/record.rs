//! The dataset record: one observed event with a date, a position and
//! whatever descriptive fields the source carried.

use crate::types::location::LatLon;
use crate::types::observation::WeatherObservation;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One event of the dataset.
///
/// Identity is the record's position in the dataset, not any field. Records are
/// created once at load time and afterwards only ever gain (or keep) a `weather`
/// value.
///
/// Fields the model does not name are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Date of the event as the source wrote it, normally `"YYYY-MM-DD"`.
    /// Kept verbatim; see [`SourceRecord::calendar_date`] for the parsed value.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Attached weather. `None` is written as `null`.
    #[serde(default)]
    pub weather: Option<WeatherObservation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceRecord {
    /// A record with only date and position set.
    pub fn new(date: Option<NaiveDate>, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            date: date.map(|date| date.format("%Y-%m-%d").to_string()),
            time: None,
            country: None,
            region: None,
            locale: None,
            description: None,
            shape: None,
            latitude,
            longitude,
            weather: None,
            extra: Map::new(),
        }
    }

    /// Position of the record, if both coordinates are present and finite.
    pub fn location(&self) -> Option<LatLon> {
        LatLon::checked(self.latitude?, self.longitude?)
    }

    /// The date parsed as a calendar day. `None` when missing or not of the
    /// form `"YYYY-MM-DD[ HH:MM:SS]"`.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date)
    }

    pub fn year(&self) -> Option<i32> {
        self.calendar_date().map(|date| date.year())
    }

    pub fn has_weather(&self) -> bool {
        self.weather.is_some()
    }
}

/// Parses the date part of a `"YYYY-MM-DD[ HH:MM[:SS]]"` value.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
