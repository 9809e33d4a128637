mod cli;

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;
use weather_enrich::{
    CancellationToken, CoverageReport, EnrichConfig, EnrichmentOrchestrator, EnrichmentSummary,
    RecordStore, RunProgress, WeatherSource,
};

use crate::cli::{BuildArgs, Cli, Commands, CoverageArgs, RepairArgs};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let code = exit_code(run().await);
    if code != 0 {
        std::process::exit(code);
    }
}

/// 0 on success, including runs where some lookups found no data or the
/// run was interrupted. 1 when the source could not be read or the result
/// could not be written.
fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {:#}", err);
            1
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build(args).await,
        Commands::Repair(args) => repair(args).await,
        Commands::Coverage(args) => coverage(args).await,
    }
}

async fn build(args: BuildArgs) -> Result<()> {
    let mut config = args.tuning.resolve(EnrichConfig::fresh_build()).await?;
    if args.max_records.is_some() {
        config.max_records = args.max_records;
    }

    let source = config.weather_fetcher()?;
    build_dataset(source, &config, &args.input, &args.output, interrupt_on_ctrl_c()).await?;
    Ok(())
}

async fn build_dataset<S: WeatherSource>(
    source: S,
    config: &EnrichConfig,
    input: &Path,
    output: &Path,
    cancel: CancellationToken,
) -> Result<EnrichmentSummary> {
    println!("Reading {}...", input.display());
    let mut store = RecordStore::load_csv(input, config.max_records).await?;
    println!("Processing {} records...", store.len());

    let summary = orchestrator(source, config, cancel)
        .run_fresh_build(&mut store, print_progress)
        .await;

    finish(&store, output, &summary).await?;
    Ok(summary)
}

async fn repair(args: RepairArgs) -> Result<()> {
    let mut config = args.tuning.resolve(EnrichConfig::repair()).await?;
    if let Some(min_year) = args.min_year {
        config.min_year = min_year;
    }

    let source = config.weather_fetcher()?;
    let output = args.output.as_deref().unwrap_or(&args.data);
    repair_dataset(source, &config, &args.data, output, interrupt_on_ctrl_c()).await?;
    Ok(())
}

async fn repair_dataset<S: WeatherSource>(
    source: S,
    config: &EnrichConfig,
    data: &Path,
    output: &Path,
    cancel: CancellationToken,
) -> Result<EnrichmentSummary> {
    println!("Loading {}...", data.display());
    let mut store = RecordStore::load(data).await?;

    let summary = orchestrator(source, config, cancel)
        .run_repair(&mut store, config.min_year, print_progress)
        .await;

    finish(&store, output, &summary).await?;
    Ok(summary)
}

async fn coverage(args: CoverageArgs) -> Result<()> {
    let store = RecordStore::load(&args.data).await?;
    println!("{}", CoverageReport::from_records(store.records()));
    Ok(())
}

/// A token cancelled by the first Ctrl-C.
fn interrupt_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing up...");
            token.cancel();
        }
    });
    cancel
}

fn orchestrator<S: WeatherSource>(
    source: S,
    config: &EnrichConfig,
    cancel: CancellationToken,
) -> EnrichmentOrchestrator<S> {
    info!("Using config {:?}", config);
    EnrichmentOrchestrator::builder(source)
        .retry_policy(config.retry_policy())
        .batch_config(config.batch_config())
        .precision(config.precision())
        .cancel(cancel)
        .build()
}

fn print_progress(progress: &RunProgress) {
    let batch = &progress.batch;
    print!(
        "\rFetching weather: {}/{} ({:.1}%) - fixed: {}",
        batch.processed,
        batch.total,
        batch.percent(),
        progress.records_fixed
    );
    let _ = std::io::stdout().flush();
}

async fn finish(store: &RecordStore, output: &Path, summary: &EnrichmentSummary) -> Result<()> {
    println!();
    println!("Writing {} records to {}...", store.len(), output.display());
    store.save(output).await?;
    println!("{}", summary);
    Ok(())
}
