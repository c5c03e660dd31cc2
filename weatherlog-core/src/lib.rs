//! Core library for the `weatherlog` CLI.
//!
//! This crate defines:
//! - The canonical observation record and its SQLite-backed store
//! - The weatherapi.com client that normalizes provider payloads
//! - Windowed aggregation queries over stored observations
//! - The periodic ingestion loop and day-by-day backfill
//!
//! It is used by `weatherlog-cli`, but can also be reused by other
//! binaries or services.

pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod provider;
pub mod store;

pub use analytics::{Verdict, Window, WindowComparison, compare_to_window, monthly_average};
pub use config::Config;
pub use error::WeatherError;
pub use ingest::{BackfillReport, backfill, run_cycle, run_ingest_loop};
pub use model::{InsertOutcome, Observation};
pub use provider::WeatherApiClient;
pub use store::Store;
