mod config;
mod enrich;
mod error;
mod fetch;
mod request;
mod schedule;
mod store;
mod types;

pub use config::{EnrichConfig, DEFAULT_MIN_YEAR};
pub use error::EnrichError;

pub use enrich::orchestrator::*;
pub use enrich::report::{CoverageReport, YearCoverage};

pub use fetch::archive::{parse_daily_response, WeatherFetcher, DAILY_METRICS, DEFAULT_ARCHIVE_URL};
pub use fetch::error::FetchError;
pub use fetch::retry::{RetryPolicy, RetryingFetcher};
pub use fetch::source::WeatherSource;

pub use request::key::{build_key, group_by_key, Precision, RequestGroup, RequestKey};

pub use schedule::batch::{
    BatchConfig, BatchProgress, BatchScheduler, EnrichmentResult, ScheduleOutcome,
};

pub use store::error::StoreError;
pub use store::record_store::RecordStore;

pub use types::location::LatLon;
pub use types::observation::{FetchOutcome, WeatherObservation};
pub use types::record::SourceRecord;
pub use types::weather_condition::WeatherCondition;

pub use tokio_util::sync::CancellationToken;
