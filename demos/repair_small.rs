// demos/repair_small.rs
use chrono::NaiveDate;
use weather_enrich::{EnrichConfig, EnrichError, EnrichmentOrchestrator, RecordStore, SourceRecord};

#[tokio::main]
async fn main() -> Result<(), EnrichError> {
    // Set RUST_LOG=info (or debug) to see each lookup and retry
    env_logger::init();

    // Two sightings on the same evening a few hundred metres apart share one lookup
    let evening = NaiveDate::from_ymd_opt(2021, 5, 1);
    let mut store = RecordStore::new(vec![
        SourceRecord::new(evening, Some(40.712), Some(-74.006)),
        SourceRecord::new(evening, Some(40.714), Some(-74.004)),
        SourceRecord::new(NaiveDate::from_ymd_opt(2015, 8, 12), Some(51.5074), Some(-0.1278)),
    ]);

    let config = EnrichConfig::repair();
    let orchestrator = EnrichmentOrchestrator::builder(config.weather_fetcher()?)
        .retry_policy(config.retry_policy())
        .batch_config(config.batch_config())
        .precision(config.precision())
        .build();

    let summary = orchestrator
        .run_repair(&mut store, config.min_year, |progress| {
            println!(
                "Batch {}/{}: {} records fixed so far",
                progress.batch.batch, progress.batch.batches, progress.records_fixed
            );
        })
        .await;
    println!("{}", summary);

    for record in store.records() {
        match &record.weather {
            Some(weather) => println!(
                "{:?} at {:?}: {}, max {:?}°C",
                record.date, record.location(), weather.condition, weather.temperature_max
            ),
            None => println!("{:?} at {:?}: no weather", record.date, record.location()),
        }
    }

    Ok(())
}
