//! Periodic ingestion loop and day-by-day historical backfill.
//!
//! Both paths share the same failure policy: an error in one cycle or
//! one day is logged and skipped, never terminating the loop.

use chrono::NaiveDate;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::WeatherError;
use crate::model::InsertOutcome;
use crate::provider::WeatherApiClient;
use crate::store::Store;

/// How often the loop reports the time left until the next cycle.
const REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// One fetch-and-store attempt for current conditions.
pub async fn run_cycle(
    client: &WeatherApiClient,
    store: &Store,
    city: &str,
) -> Result<InsertOutcome, WeatherError> {
    let observation = client.fetch_current(city).await?;
    let outcome = store.insert(&observation)?;

    match outcome {
        InsertOutcome::Inserted => {
            info!(city, observed_at = %observation.observed_at, "stored new observation");
        }
        InsertOutcome::AlreadyPresent => {
            info!(city, observed_at = %observation.observed_at, "store already up to date");
        }
    }

    Ok(outcome)
}

/// Run an immediate cycle for `city`, then one every `every`, until the
/// token is cancelled.
///
/// Cancellation interrupts the inter-cycle wait immediately instead of
/// letting the current sleep run out. Failed cycles are logged and the
/// loop keeps its cadence.
pub async fn run_ingest_loop(
    client: &WeatherApiClient,
    store: &Store,
    city: &str,
    every: Duration,
    cancel: CancellationToken,
) {
    info!(city, every_secs = every.as_secs(), "starting ingestion loop");

    let mut ticker = interval(every);
    let mut report = interval_at(Instant::now() + REPORT_INTERVAL, REPORT_INTERVAL);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut next_cycle = Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(city, "ingestion loop cancelled");
                return;
            }
            _ = ticker.tick() => {
                next_cycle = Instant::now() + every;
                if let Err(err) = run_cycle(client, store, city).await {
                    warn!(city, error = %err, "fetch cycle failed, skipping until next run");
                }
            }
            _ = report.tick() => {
                let remaining = next_cycle.saturating_duration_since(Instant::now());
                info!(city, remaining_secs = remaining.as_secs(), "waiting for next fetch cycle");
            }
        }
    }
}

/// Outcome counters for one backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub inserted: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Fetch one historical observation per day for the `days` calendar days
/// before `end` (exclusive), storing each.
///
/// A failed day is counted and logged, and the run continues with the
/// next day.
pub async fn backfill(
    client: &WeatherApiClient,
    store: &Store,
    city: &str,
    days: u32,
    end: NaiveDate,
) -> BackfillReport {
    let start = end - chrono::Duration::days(i64::from(days));
    info!(city, %start, %end, "starting historical backfill");

    let mut report = BackfillReport::default();
    let mut day = start;
    while day < end {
        match fetch_and_store_day(client, store, city, day).await {
            Ok(InsertOutcome::Inserted) => report.inserted += 1,
            Ok(InsertOutcome::AlreadyPresent) => report.skipped += 1,
            Err(err) => {
                warn!(city, %day, error = %err, "backfill day failed, continuing");
                report.failed += 1;
            }
        }
        day = day + chrono::Duration::days(1);
    }

    info!(
        city,
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        "backfill finished"
    );
    report
}

async fn fetch_and_store_day(
    client: &WeatherApiClient,
    store: &Store,
    city: &str,
    day: NaiveDate,
) -> Result<InsertOutcome, WeatherError> {
    let observation = client.fetch_history_day(city, day).await?;
    store.insert(&observation)
}
