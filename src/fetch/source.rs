use crate::fetch::error::FetchError;
use crate::types::location::LatLon;
use crate::types::observation::FetchOutcome;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Anything that can answer "what was the weather on `date` at `location`".
///
/// Implemented by [`crate::WeatherFetcher`] for the remote archive; tests plug
/// in scripted implementations.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Looks up one day at one coordinate.
    ///
    /// `Ok(FetchOutcome::NoData)` means the archive answered but holds nothing
    /// for that day and place. Errors are reserved for failed exchanges.
    async fn fetch(&self, location: LatLon, date: NaiveDate) -> Result<FetchOutcome, FetchError>;
}
