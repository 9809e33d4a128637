use crate::fetch::source::WeatherSource;
use crate::types::location::LatLon;
use crate::types::observation::FetchOutcome;
use chrono::NaiveDate;
use log::{debug, warn};
use std::time::Duration;

/// How hard to try before settling for "no data".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after attempt `n` is `n * base_delay`.
    pub base_delay: Duration,
    /// Whether a "no data" answer is retried like a failure. The archive does
    /// occasionally answer with an empty day under load, but for dates it truly
    /// does not cover every retry is wasted.
    pub retry_on_no_data: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            retry_on_no_data: true,
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Pause after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Wraps a [`WeatherSource`] with bounded, linearly backed-off retries.
///
/// Nothing escapes this boundary: every failure mode ends as either an
/// observation or [`FetchOutcome::NoData`].
#[derive(Debug, Clone)]
pub struct RetryingFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: WeatherSource> RetryingFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_with_retry(&self, location: LatLon, date: NaiveDate) -> FetchOutcome {
        let attempts = self.policy.attempts();

        for attempt in 1..=attempts {
            match self.source.fetch(location, date).await {
                Ok(FetchOutcome::Observed(observation)) => {
                    return FetchOutcome::Observed(observation);
                }
                Ok(FetchOutcome::NoData) if !self.policy.retry_on_no_data => {
                    return FetchOutcome::NoData;
                }
                Ok(FetchOutcome::NoData) => {
                    debug!(
                        "No data for {} at {:?} (attempt {}/{})",
                        date, location, attempt, attempts
                    );
                }
                Err(e) => {
                    debug!(
                        "Lookup for {} at {:?} failed with {} error (attempt {}/{}): {}",
                        date,
                        location,
                        e.kind(),
                        attempt,
                        attempts,
                        e
                    );
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        warn!(
            "Giving up on {} at {:?} after {} attempts",
            date, location, attempts
        );
        FetchOutcome::NoData
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::error::FetchError;
    use crate::types::observation::WeatherObservation;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays a fixed script of answers and records when it was called.
    struct ScriptedSource {
        script: Mutex<Vec<Result<FetchOutcome, FetchError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(mut script: Vec<Result<FetchOutcome, FetchError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherSource for ScriptedSource {
        async fn fetch(&self, _: LatLon, _: NaiveDate) -> Result<FetchOutcome, FetchError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(timeout()))
        }
    }

    fn timeout() -> FetchError {
        FetchError::Timeout {
            url: "test".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    fn protocol() -> FetchError {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        FetchError::Protocol("test".to_string(), source)
    }

    fn observed() -> FetchOutcome {
        FetchOutcome::Observed(WeatherObservation::from_code(2))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, 1).unwrap()
    }

    fn policy(max_attempts: u32, retry_on_no_data: bool) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1000),
            retry_on_no_data,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let source = ScriptedSource::new(vec![Err(timeout()), Err(protocol()), Ok(observed())]);
        let fetcher = RetryingFetcher::new(source, policy(3, true));

        let outcome = fetcher.fetch_with_retry(LatLon(1.0, 2.0), date()).await;

        assert_eq!(outcome, observed());
        assert_eq!(fetcher.source().call_times().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_returns_no_data_after_max_attempts() {
        let source = ScriptedSource::new(Vec::new());
        let fetcher = RetryingFetcher::new(source, policy(4, true));

        let outcome = fetcher.fetch_with_retry(LatLon(1.0, 2.0), date()).await;

        assert_eq!(outcome, FetchOutcome::NoData);
        let calls = fetcher.source().call_times();
        assert_eq!(calls.len(), 4);

        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps[0] >= Duration::from_millis(1000));
        assert!(gaps[1] >= Duration::from_millis(2000));
        assert!(gaps[2] >= Duration::from_millis(3000));
        assert!(gaps.windows(2).all(|w| w[1] > w[0]), "gaps: {:?}", gaps);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_data_is_retried_when_configured() {
        let source = ScriptedSource::new(vec![Ok(FetchOutcome::NoData), Ok(observed())]);
        let fetcher = RetryingFetcher::new(source, policy(3, true));

        assert_eq!(fetcher.fetch_with_retry(LatLon(0.0, 0.0), date()).await, observed());
        assert_eq!(fetcher.source().call_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_data_is_final_when_not_retried() {
        let source = ScriptedSource::new(vec![Ok(FetchOutcome::NoData), Ok(observed())]);
        let fetcher = RetryingFetcher::new(source, policy(3, false));

        let outcome = fetcher.fetch_with_retry(LatLon(0.0, 0.0), date()).await;

        assert_eq!(outcome, FetchOutcome::NoData);
        assert_eq!(fetcher.source().call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let source = ScriptedSource::new(vec![Ok(observed())]);
        let fetcher = RetryingFetcher::new(source, policy(0, true));

        assert_eq!(fetcher.fetch_with_retry(LatLon(0.0, 0.0), date()).await, observed());
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(3000));
    }
}
