//! Deduplication of weather lookups.
//!
//! Records that happened on the same day at (nearly) the same place need only
//! one lookup. A [`RequestKey`] captures that identity: the date plus both
//! coordinates rounded to a fixed number of decimals. Rounded coordinates are
//! held as scaled integers so the key has exact structural equality and can be
//! hashed.

use crate::types::location::LatLon;
use crate::types::record::SourceRecord;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

/// Largest supported number of decimals. Six decimals is ~0.1 m, far below
/// the resolution of the archive grid.
pub const MAX_PRECISION: u8 = 6;

/// Number of decimal places coordinates are rounded to before deduplication.
///
/// One decimal groups records within roughly 11 km, two decimals within roughly 1 km.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precision(u8);

impl Precision {
    /// Clamps `decimals` to [`MAX_PRECISION`].
    pub fn new(decimals: u8) -> Self {
        Precision(decimals.min(MAX_PRECISION))
    }

    pub fn decimals(&self) -> u8 {
        self.0
    }

    fn scale(&self) -> f64 {
        10f64.powi(i32::from(self.0))
    }

    fn to_units(self, coordinate: f64) -> i64 {
        (coordinate * self.scale()).round() as i64
    }

    fn from_units(self, units: i64) -> f64 {
        units as f64 / self.scale()
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision(2)
    }
}

/// The identity of one weather lookup: `(date, round(lat, N), round(lon, N))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey {
    date: NaiveDate,
    latitude_units: i64,
    longitude_units: i64,
    precision: Precision,
}

impl RequestKey {
    pub fn new(date: NaiveDate, location: LatLon, precision: Precision) -> Self {
        Self {
            date,
            latitude_units: precision.to_units(location.latitude()),
            longitude_units: precision.to_units(location.longitude()),
            precision,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The rounded coordinate the lookup is issued for.
    pub fn location(&self) -> LatLon {
        LatLon(
            self.precision.from_units(self.latitude_units),
            self.precision.from_units(self.longitude_units),
        )
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = usize::from(self.precision.decimals());
        let location = self.location();
        write!(
            f,
            "{}@{:.*},{:.*}",
            self.date,
            decimals,
            location.latitude(),
            decimals,
            location.longitude()
        )
    }
}

/// A request key and the positions of every record that shares it, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestGroup {
    pub key: RequestKey,
    pub indices: Vec<usize>,
}

/// Derives the request key of a record.
///
/// Returns `None` when the date is missing or either coordinate is missing or
/// not a finite number.
pub fn build_key(record: &SourceRecord, precision: Precision) -> Option<RequestKey> {
    let date = record.calendar_date()?;
    let location = record.location()?;
    Some(RequestKey::new(date, location, precision))
}

/// Groups `(index, record)` pairs by request key.
///
/// Records without a key are skipped. Groups are returned in order of the
/// first appearance of their key, and indices within a group keep input order.
pub fn group_by_key<'a, I>(records: I, precision: Precision) -> Vec<RequestGroup>
where
    I: IntoIterator<Item = (usize, &'a SourceRecord)>,
{
    let mut groups: Vec<RequestGroup> = Vec::new();
    let mut positions: HashMap<RequestKey, usize> = HashMap::new();

    for (index, record) in records {
        let Some(key) = build_key(record, precision) else {
            continue;
        };
        match positions.get(&key) {
            Some(&position) => groups[position].indices.push(index),
            None => {
                positions.insert(key, groups.len());
                groups.push(RequestGroup {
                    key,
                    indices: vec![index],
                });
            }
        }
    }

    groups
}

/// Total number of records covered by `groups`.
pub fn grouped_record_count(groups: &[RequestGroup]) -> usize {
    groups.iter().map(|group| group.indices.len()).sum()
}
