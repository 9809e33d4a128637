//! Policy constants of an enrichment run.
//!
//! Two presets mirror the two pipelines: a fast, wide fresh build and a slow,
//! careful repair pass. A JSON file can overlay either preset; any key it
//! omits keeps the preset's value.

use crate::error::EnrichError;
use crate::fetch::archive::{WeatherFetcher, DEFAULT_ARCHIVE_URL};
use crate::fetch::retry::RetryPolicy;
use crate::request::key::Precision;
use crate::schedule::batch::BatchConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

/// Year before which repair runs leave records alone.
pub const DEFAULT_MIN_YEAR: i32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    /// Decimals kept when rounding coordinates into request keys.
    pub precision: u8,
    pub batch_size: usize,
    pub concurrency: usize,
    pub batch_delay_ms: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub retry_no_data: bool,
    /// Repair runs only: earliest year considered.
    pub min_year: i32,
    /// Fresh builds only: keep at most this many source rows.
    pub max_records: Option<usize>,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self::repair()
    }
}

impl EnrichConfig {
    /// Wide batches, short pause, a single attempt per lookup.
    pub fn fresh_build() -> Self {
        Self {
            batch_size: 50,
            concurrency: 50,
            batch_delay_ms: 200,
            max_attempts: 1,
            ..Self::repair()
        }
    }

    /// Narrow batches, longer pause, three attempts with 1 s linear backoff.
    pub fn repair() -> Self {
        Self {
            api_url: DEFAULT_ARCHIVE_URL.to_string(),
            timeout_secs: 10,
            precision: Precision::default().decimals(),
            batch_size: 5,
            concurrency: 5,
            batch_delay_ms: 500,
            max_attempts: 3,
            retry_delay_ms: 1000,
            retry_no_data: true,
            min_year: DEFAULT_MIN_YEAR,
            max_records: None,
        }
    }

    /// Reads a JSON object from `path` and lays its keys over `self`.
    pub async fn overlay_file(self, path: &Path) -> Result<Self, EnrichError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| EnrichError::ConfigRead(path.to_path_buf(), e))?;
        self.overlay_json(&bytes)
            .map_err(|e| EnrichError::ConfigParse(path.to_path_buf(), e))
    }

    pub fn overlay_json(self, bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let overrides: Map<String, Value> = serde_json::from_slice(bytes)?;
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merged.extend(overrides);
        serde_json::from_value(Value::Object(merged))
    }

    pub fn precision(&self) -> Precision {
        Precision::new(self.precision)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_delay_ms),
            retry_on_no_data: self.retry_no_data,
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            inter_batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }

    /// HTTP fetcher for the configured endpoint and timeout.
    pub fn weather_fetcher(&self) -> Result<WeatherFetcher, EnrichError> {
        Ok(WeatherFetcher::builder()
            .base_url(self.api_url.clone())
            .timeout(self.timeout())
            .build()?)
    }
}
