//! Reads the raw sightings CSV that seeds a fresh build.
//!
//! Expected header: `Date_time,Country,Region,Locale,Description,UFO_shape,latitude,longitude`.
//! Other columns are ignored. Short rows are accepted and their missing cells read as empty.

use crate::store::error::StoreError;
use crate::types::record::SourceRecord;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date_time", default)]
    date_time: String,
    #[serde(rename = "Country", default)]
    country: String,
    #[serde(rename = "Region", default)]
    region: String,
    #[serde(rename = "Locale", default)]
    locale: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "UFO_shape", default)]
    shape: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
}

impl From<CsvRow> for SourceRecord {
    fn from(row: CsvRow) -> Self {
        let mut parts = row.date_time.split_whitespace();
        let date = parts.next().map(str::to_string);
        let time = parts.next().map(str::to_string);

        let mut record = SourceRecord::new(
            None,
            parse_coordinate(&row.latitude),
            parse_coordinate(&row.longitude),
        );
        record.date = date;
        record.time = time;
        record.country = Some(row.country);
        record.region = Some(row.region);
        record.locale = Some(row.locale);
        record.description = Some(row.description);
        record.shape = Some(row.shape);
        record
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses every row of `reader`. `origin` only labels errors.
pub fn read_records<R: Read>(reader: R, origin: &Path) -> Result<Vec<SourceRecord>, StoreError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let csv_error = |e: csv::Error| StoreError::Csv(origin.to_path_buf(), e);

    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    let mut records = Vec::new();
    for row in csv_reader.records() {
        let mut row = row.map_err(csv_error)?;
        while row.len() < headers.len() {
            row.push_field("");
        }
        let parsed: CsvRow = row.deserialize(Some(&headers)).map_err(csv_error)?;
        records.push(SourceRecord::from(parsed));
    }
    Ok(records)
}

/// Opens and parses the CSV at `path`.
pub fn read_records_from_path(path: &Path) -> Result<Vec<SourceRecord>, StoreError> {
    let file =
        std::fs::File::open(path).map_err(|e| StoreError::Read(path.to_path_buf(), e))?;
    read_records(std::io::BufReader::new(file), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Date_time,Country,Region,Locale,Description,UFO_shape,latitude,longitude
2021-05-01 21:30:00,United States,New York,New York City,\"bright, pulsing light\",Light,40.71,-74.00
unknown,Canada,Ontario,Toronto,disc,Disk,43.65,-79.38
1990-01-01 03:00:00,Nowhere,,,faint,Other,n/a,0
2001-02-03 04:05:06,Short,Row
";

    #[test]
    fn test_read_records_maps_columns() {
        let records = read_records(SAMPLE.as_bytes(), Path::new("sample.csv")).unwrap();
        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.calendar_date(), NaiveDate::from_ymd_opt(2021, 5, 1));
        assert_eq!(first.time.as_deref(), Some("21:30:00"));
        assert_eq!(first.description.as_deref(), Some("bright, pulsing light"));
        assert_eq!(first.shape.as_deref(), Some("Light"));
        assert_eq!(first.latitude, Some(40.71));
        assert_eq!(first.longitude, Some(-74.0));
        assert!(first.weather.is_none());

        assert_eq!(records[1].date.as_deref(), Some("unknown"));
        assert_eq!(records[1].calendar_date(), None);
        assert_eq!(records[1].time, None);

        assert_eq!(records[2].latitude, None);
        assert_eq!(records[2].longitude, Some(0.0));
        assert!(records[2].location().is_none());

        assert_eq!(records[3].region.as_deref(), Some("Row"));
        assert_eq!(records[3].locale.as_deref(), Some(""));
        assert_eq!(records[3].shape.as_deref(), Some(""));
        assert_eq!(records[3].latitude, None);
    }
}
