//! Top-level driver of an enrichment run.
//!
//! A run selects target records, groups them by request key, drives the
//! batch scheduler over the groups and merges the results back into the
//! store. Writing the store out is left to the caller so a failed write can
//! be retried against the same in-memory state.

use crate::fetch::retry::{RetryPolicy, RetryingFetcher};
use crate::fetch::source::WeatherSource;
use crate::request::key::{group_by_key, grouped_record_count, Precision, RequestGroup, RequestKey};
use crate::schedule::batch::{BatchConfig, BatchProgress, BatchScheduler, EnrichmentResult};
use crate::store::record_store::RecordStore;
use crate::types::record::SourceRecord;
use bon::bon;
use log::{info, warn};
use std::collections::HashMap;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Which records a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Every record with a usable date and position.
    FreshBuild,
    /// Only records still without weather, dated `min_year` or later.
    Repair { min_year: i32 },
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::FreshBuild => write!(f, "fresh build"),
            RunMode::Repair { min_year } => write!(f, "repair (year >= {})", min_year),
        }
    }
}

/// Progress as seen by the caller: the scheduler's counters plus records updated so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProgress {
    pub batch: BatchProgress,
    pub records_fixed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub mode: RunMode,
    pub total_records: usize,
    pub with_weather: usize,
    /// Records that gained weather in this run.
    pub fixed: usize,
    /// Records that had a request key among the targeted ones.
    pub selected_records: usize,
    pub unique_requests: usize,
    /// Lookups that completed (all of them unless cancelled).
    pub completed_requests: usize,
    pub cancelled: bool,
}

impl fmt::Display for EnrichmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary ({}):", self.mode)?;
        writeln!(f, "- Total records: {}", self.total_records)?;
        writeln!(f, "- Records with weather: {}", self.with_weather)?;
        writeln!(
            f,
            "- Records without weather: {}",
            self.total_records - self.with_weather
        )?;
        writeln!(
            f,
            "- Unique API calls: {} for {} records",
            self.unique_requests, self.selected_records
        )?;
        write!(f, "- Fixed in this run: {}", self.fixed)?;
        if self.cancelled {
            write!(
                f,
                "\n- Interrupted after {}/{} calls",
                self.completed_requests, self.unique_requests
            )?;
        }
        Ok(())
    }
}

/// Selection used by repair runs: no weather yet, recent enough, and positioned.
pub fn repair_candidate(min_year: i32) -> impl Fn(&SourceRecord) -> bool + Clone {
    move |record: &SourceRecord| {
        !record.has_weather()
            && record.year().is_some_and(|year| year >= min_year)
            && record.location().is_some()
    }
}

pub struct EnrichmentOrchestrator<S> {
    fetcher: RetryingFetcher<S>,
    scheduler: BatchScheduler,
    precision: Precision,
    cancel: CancellationToken,
}

#[bon]
impl<S: WeatherSource> EnrichmentOrchestrator<S> {
    /// Creates an orchestrator over `source`.
    ///
    /// * `.retry_policy(RetryPolicy)`: defaults to [`RetryPolicy::default`].
    /// * `.batch_config(BatchConfig)`: defaults to [`BatchConfig::default`].
    /// * `.precision(Precision)`: request key rounding, defaults to two decimals.
    /// * `.cancel(CancellationToken)`: token that interrupts the run.
    #[builder]
    pub fn new(
        #[builder(start_fn)] source: S,
        retry_policy: Option<RetryPolicy>,
        batch_config: Option<BatchConfig>,
        precision: Option<Precision>,
        cancel: Option<CancellationToken>,
    ) -> Self {
        Self {
            fetcher: RetryingFetcher::new(source, retry_policy.unwrap_or_default()),
            scheduler: BatchScheduler::new(batch_config.unwrap_or_default()),
            precision: precision.unwrap_or_default(),
            cancel: cancel.unwrap_or_else(CancellationToken::new),
        }
    }
}

impl<S: WeatherSource> EnrichmentOrchestrator<S> {
    pub fn fetcher(&self) -> &RetryingFetcher<S> {
        &self.fetcher
    }

    /// Looks up every record that has a date and position, once per request key.
    ///
    /// Groups the archive has no data for are written as `null`.
    pub async fn run_fresh_build<F>(&self, store: &mut RecordStore, on_progress: F) -> EnrichmentSummary
    where
        F: FnMut(&RunProgress),
    {
        let groups = group_by_key(store.records_needing_enrichment(|_| true), self.precision);
        self.run(store, RunMode::FreshBuild, groups, on_progress).await
    }

    /// Looks up only records without weather dated `min_year` or later.
    ///
    /// Records outside the selection, and records whose lookup still yields no
    /// data, are left exactly as they were.
    pub async fn run_repair<F>(
        &self,
        store: &mut RecordStore,
        min_year: i32,
        on_progress: F,
    ) -> EnrichmentSummary
    where
        F: FnMut(&RunProgress),
    {
        let groups = group_by_key(
            store.records_needing_enrichment(repair_candidate(min_year)),
            self.precision,
        );
        self.run(store, RunMode::Repair { min_year }, groups, on_progress)
            .await
    }

    async fn run<F>(
        &self,
        store: &mut RecordStore,
        mode: RunMode,
        groups: Vec<RequestGroup>,
        mut on_progress: F,
    ) -> EnrichmentSummary
    where
        F: FnMut(&RunProgress),
    {
        let selected_records = grouped_record_count(&groups);
        info!(
            "{}: {} records selected, {} unique lookups needed",
            mode,
            selected_records,
            groups.len()
        );

        let group_sizes: HashMap<RequestKey, usize> = groups
            .iter()
            .map(|group| (group.key, group.indices.len()))
            .collect();
        let mut records_fixed = 0;

        let outcome = self
            .scheduler
            .run(&self.fetcher, &groups, &self.cancel, |batch, results| {
                records_fixed += results
                    .iter()
                    .filter(|result| result.outcome.is_observed())
                    .map(|result| group_sizes.get(&result.key).copied().unwrap_or(0))
                    .sum::<usize>();
                on_progress(&RunProgress {
                    batch: *batch,
                    records_fixed,
                });
            })
            .await;

        let fixed = apply_results(store, mode, &groups, &outcome.results);
        if outcome.cancelled {
            warn!(
                "Run interrupted: {}/{} lookups completed",
                outcome.results.len(),
                groups.len()
            );
        }

        EnrichmentSummary {
            mode,
            total_records: store.len(),
            with_weather: store.with_weather_count(),
            fixed,
            selected_records,
            unique_requests: groups.len(),
            completed_requests: outcome.results.len(),
            cancelled: outcome.cancelled,
        }
    }
}

/// Merges scheduler results into the store. Results arrive in group order,
/// possibly truncated by cancellation. Returns the number of records that
/// received an observation.
fn apply_results(
    store: &mut RecordStore,
    mode: RunMode,
    groups: &[RequestGroup],
    results: &[EnrichmentResult],
) -> usize {
    let mut fixed = 0;
    for (group, result) in groups.iter().zip(results) {
        debug_assert_eq!(group.key, result.key);
        match (mode, result.outcome.observation()) {
            (_, Some(observation)) => {
                fixed += store.apply_result(&group.indices, Some(observation));
            }
            (RunMode::FreshBuild, None) => {
                store.apply_result(&group.indices, None);
            }
            (RunMode::Repair { .. }, None) => {}
        }
    }
    fixed
}
