//! Per-year weather coverage of a dataset, used to pick a sensible repair cutoff.

use crate::types::record::SourceRecord;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearCoverage {
    pub year: i32,
    pub with_weather: usize,
    pub without_weather: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageReport {
    /// One entry per year that has at least one dated record, ascending.
    pub years: Vec<YearCoverage>,
    /// Records without a usable date.
    pub undated: usize,
}

impl CoverageReport {
    pub fn from_records(records: &[SourceRecord]) -> Self {
        let mut years: BTreeMap<i32, YearCoverage> = BTreeMap::new();
        let mut undated = 0;

        for record in records {
            let Some(year) = record.year() else {
                undated += 1;
                continue;
            };
            let entry = years.entry(year).or_insert(YearCoverage {
                year,
                with_weather: 0,
                without_weather: 0,
            });
            if record.has_weather() {
                entry.with_weather += 1;
            } else {
                entry.without_weather += 1;
            }
        }

        Self {
            years: years.into_values().collect(),
            undated,
        }
    }

    /// First and last year with at least one enriched record.
    pub fn weather_year_range(&self) -> Option<(i32, i32)> {
        let mut with_weather = self.years.iter().filter(|y| y.with_weather > 0);
        let first = with_weather.next()?.year;
        let last = with_weather.last().map_or(first, |y| y.year);
        Some((first, last))
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records WITHOUT weather by year:")?;
        for year in self.years.iter().filter(|y| y.without_weather > 0) {
            writeln!(f, "  {}: {}", year.year, year.without_weather)?;
        }
        writeln!(f)?;
        writeln!(f, "Records WITH weather by year:")?;
        for year in self.years.iter().filter(|y| y.with_weather > 0) {
            writeln!(f, "  {}: {}", year.year, year.with_weather)?;
        }
        if self.undated > 0 {
            writeln!(f)?;
            writeln!(f, "Undated records: {}", self.undated)?;
        }
        writeln!(f)?;
        match self.weather_year_range() {
            Some((first, last)) => write!(f, "Weather data available from {} to {}", first, last),
            None => write!(f, "No records have weather data"),
        }
    }
}
