use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use weather_enrich::EnrichConfig;

#[derive(Parser, Debug)]
#[command(
    name = "weather-enrich",
    version,
    about = "Attach historical daily weather to dated, geolocated records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enrich every record of a raw CSV export and write the JSON dataset.
    Build(BuildArgs),
    /// Fill in weather for recent records that still have none.
    Repair(RepairArgs),
    /// Show weather coverage per year.
    Coverage(CoverageArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(long, default_value = "ufo-sightings-transformed.csv")]
    pub input: PathBuf,

    #[arg(long, default_value = "data.json")]
    pub output: PathBuf,

    /// Only process the first N rows of the CSV.
    #[arg(long)]
    pub max_records: Option<usize>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RepairArgs {
    #[arg(long, default_value = "data.json")]
    pub data: PathBuf,

    /// Where to write the result. Defaults to overwriting `--data`.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Earliest year to repair.
    #[arg(long)]
    pub min_year: Option<i32>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CoverageArgs {
    #[arg(long, default_value = "data.json")]
    pub data: PathBuf,
}

/// Knobs shared by `build` and `repair`. Unset flags keep the value from
/// `--config` or the command's preset.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// JSON file overlaying the command's preset.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub api_url: Option<String>,

    /// Decimals kept when rounding coordinates for deduplication.
    #[arg(long)]
    pub precision: Option<u8>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Concurrent lookups inside one batch.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub batch_delay_ms: Option<u64>,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Retry lookups the archive answered with "no data".
    #[arg(long, overrides_with = "no_retry_no_data")]
    pub retry_no_data: bool,

    /// Accept "no data" answers as final.
    #[arg(long, overrides_with = "retry_no_data")]
    pub no_retry_no_data: bool,

    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl TuningArgs {
    /// Applies `--config` and then the individual flags on top of `preset`.
    pub async fn resolve(&self, preset: EnrichConfig) -> Result<EnrichConfig> {
        let mut config = match &self.config {
            Some(path) => preset.overlay_file(path).await?,
            None => preset,
        };

        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
            if self.concurrency.is_none() {
                config.concurrency = batch_size;
            }
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(delay) = self.batch_delay_ms {
            config.batch_delay_ms = delay;
        }
        if let Some(attempts) = self.max_attempts {
            config.max_attempts = attempts;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry_delay_ms = delay;
        }
        if self.retry_no_data {
            config.retry_no_data = true;
        }
        if self.no_retry_no_data {
            config.retry_no_data = false;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }
}
