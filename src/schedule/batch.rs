//! Admission control for archive lookups.
//!
//! Groups are issued in fixed-size batches. Every lookup of a batch runs
//! concurrently and the batch is joined before the next one starts; an
//! enforced pause separates consecutive batches. The archive rate-limits
//! aggressively and does not document the limit, so pacing is done here.

use crate::fetch::retry::RetryingFetcher;
use crate::fetch::source::WeatherSource;
use crate::request::key::{RequestGroup, RequestKey};
use crate::types::observation::FetchOutcome;
use futures_util::stream::{self, StreamExt};
use log::{debug, info};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pacing knobs for a scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Groups per batch. Zero is treated as one.
    pub batch_size: usize,
    /// Lookups in flight at once inside a batch, capped at `batch_size`.
    pub concurrency: usize,
    /// Pause between two batches. Not applied after the last one.
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            concurrency: 5,
            inter_batch_delay: Duration::from_millis(500),
        }
    }
}

/// The answer for one request group.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentResult {
    pub key: RequestKey,
    pub outcome: FetchOutcome,
}

/// Snapshot reported after every completed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based number of the batch just completed.
    pub batch: usize,
    pub batches: usize,
    /// Groups resolved so far.
    pub processed: usize,
    pub total: usize,
    /// Groups resolved to an observation so far.
    pub succeeded: usize,
}

impl BatchProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 * 100.0 / self.total as f64
        }
    }
}

/// Results of a scheduler run, in group order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleOutcome {
    pub results: Vec<EnrichmentResult>,
    /// True when the run stopped early because the token was cancelled.
    /// `results` then holds every batch that completed before that.
    pub cancelled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BatchScheduler {
    config: BatchConfig,
}

impl BatchScheduler {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Resolves every group through `fetcher`.
    ///
    /// `on_batch` is called after each batch with the running progress and
    /// that batch's results. A failed group never aborts the run: the retry
    /// layer has already turned it into "no data". Cancelling `cancel` stops
    /// the run at the next suspension point (mid-batch or during the pause);
    /// the batch in flight is discarded.
    pub async fn run<S, F>(
        &self,
        fetcher: &RetryingFetcher<S>,
        groups: &[RequestGroup],
        cancel: &CancellationToken,
        mut on_batch: F,
    ) -> ScheduleOutcome
    where
        S: WeatherSource,
        F: FnMut(&BatchProgress, &[EnrichmentResult]),
    {
        let batch_size = self.config.batch_size.max(1);
        let concurrency = self.config.concurrency.clamp(1, batch_size);
        let batches = groups.len().div_ceil(batch_size);
        let mut outcome = ScheduleOutcome {
            results: Vec::with_capacity(groups.len()),
            cancelled: false,
        };
        let mut succeeded = 0;

        info!(
            "Scheduling {} lookups in {} batches of up to {}",
            groups.len(),
            batches,
            batch_size
        );

        for (number, batch) in groups.chunks(batch_size).enumerate() {
            let lookups = stream::iter(batch)
                .map(|group| async move {
                    let result = fetcher
                        .fetch_with_retry(group.key.location(), group.key.date())
                        .await;
                    EnrichmentResult {
                        key: group.key,
                        outcome: result,
                    }
                })
                .buffered(concurrency)
                .collect::<Vec<_>>();

            let batch_results = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cancelled during batch {}/{}", number + 1, batches);
                    outcome.cancelled = true;
                    return outcome;
                }
                batch_results = lookups => batch_results,
            };

            succeeded += batch_results
                .iter()
                .filter(|result| result.outcome.is_observed())
                .count();
            let progress = BatchProgress {
                batch: number + 1,
                batches,
                processed: outcome.results.len() + batch_results.len(),
                total: groups.len(),
                succeeded,
            };
            debug!("Completed batch {:?}", progress);
            on_batch(&progress, &batch_results);
            outcome.results.extend(batch_results);

            if number + 1 < batches {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Cancelled after batch {}/{}", number + 1, batches);
                        outcome.cancelled = true;
                        return outcome;
                    }
                    _ = tokio::time::sleep(self.config.inter_batch_delay) => {}
                }
            }
        }

        outcome
    }
}
