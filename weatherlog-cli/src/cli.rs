use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;

use weatherlog_core::{
    Config, Store, Verdict, WeatherApiClient, WeatherError, Window, backfill, compare_to_window,
    monthly_average, run_ingest_loop,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherlog", version, about = "Weather observation archive")]
pub struct Cli {
    /// Use this observations database instead of the configured one.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and database location interactively.
    Configure,

    /// Show the most recent stored observation for a city.
    Latest {
        /// City name, e.g. "Frankfurt".
        city: String,
    },

    /// Compare the latest temperature against a windowed average.
    Compare {
        /// Lookback window: week, month or year.
        window: String,

        /// City name.
        city: String,
    },

    /// Average temperature for one month of one year.
    Average {
        /// Month number, 1-12.
        #[arg(value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        /// Four-digit year, e.g. 2023.
        year: i32,

        /// City name.
        city: String,
    },

    /// Fetch current conditions now, then on a fixed cadence until
    /// interrupted.
    GetLatestWeather {
        /// City name.
        city: String,

        /// Provider API key; falls back to the configured one.
        api_key: Option<String>,

        /// Minutes between fetch cycles.
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        every: u64,
    },

    /// Backfill one observation per day for the last N days.
    GetHistoricWeather {
        /// City name.
        city: String,

        /// Provider API key; falls back to the configured one.
        api_key: Option<String>,

        /// Number of past days to fetch.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),

            Command::Latest { city } => {
                let store = open_store(&config, self.database)?;
                match store.latest(&city)? {
                    Some(obs) => println!(
                        "Temperature: {}°C, Humidity: {}%, Wind speed: {}, \
                         Precipitation: {}, observed at {}",
                        obs.temperature, obs.humidity, obs.wind_speed, obs.precipitation,
                        obs.observed_at,
                    ),
                    None => println!("No data available for {city}."),
                }
                Ok(())
            }

            Command::Compare { window, city } => {
                let window = Window::try_from(window.as_str())?;
                let store = open_store(&config, self.database)?;

                match compare_to_window(&store, &city, window, Local::now().date_naive()) {
                    Ok(comparison) => {
                        let wording = match comparison.verdict {
                            Verdict::Above => "above",
                            Verdict::Below => "below",
                            Verdict::Equal => "the same as",
                        };
                        println!(
                            "The current temperature is {}°C, which is {wording} the \
                             average of {}°C for the past {window}.",
                            comparison.current, comparison.baseline,
                        );
                    }
                    Err(WeatherError::NoData) => println!("No data available for {city}."),
                    Err(err) => return Err(err.into()),
                }
                Ok(())
            }

            Command::Average { month, year, city } => {
                let store = open_store(&config, self.database)?;

                match monthly_average(&store, &city, month, year) {
                    Ok(average) => println!(
                        "The average temperature for {month:02}/{year} was {average:.1}°C."
                    ),
                    Err(WeatherError::NoData) => {
                        println!("No data available for {month:02}/{year}.");
                    }
                    Err(err) => return Err(err.into()),
                }
                Ok(())
            }

            Command::GetLatestWeather { city, api_key, every } => {
                let key = config.resolve_api_key(api_key)?;
                let store = open_store(&config, self.database)?;
                let client = WeatherApiClient::new(key);

                let cancel = CancellationToken::new();
                let signal = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        signal.cancel();
                    }
                });

                println!(
                    "Fetching weather for {city} every {every} minutes. Press Ctrl-C to stop."
                );
                run_ingest_loop(&client, &store, &city, Duration::from_secs(every * 60), cancel)
                    .await;
                Ok(())
            }

            Command::GetHistoricWeather { city, api_key, days } => {
                let key = config.resolve_api_key(api_key)?;
                let store = open_store(&config, self.database)?;
                let client = WeatherApiClient::new(key);

                let report =
                    backfill(&client, &store, &city, days, Local::now().date_naive()).await;
                println!(
                    "Backfill for {city} finished: {} inserted, {} already present, {} failed.",
                    report.inserted, report.skipped, report.failed,
                );
                Ok(())
            }
        }
    }
}

fn open_store(config: &Config, override_path: Option<PathBuf>) -> Result<Store> {
    let path = match override_path {
        Some(path) => path,
        None => config.database_path()?,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    Store::open(&path)
        .with_context(|| format!("Failed to open observations database: {}", path.display()))
}

fn configure(mut config: Config) -> Result<()> {
    let current_key = config.api_key.clone().unwrap_or_default();
    let key = inquire::Text::new("WeatherAPI key:")
        .with_initial_value(&current_key)
        .prompt()?;
    config.api_key = if key.trim().is_empty() { None } else { Some(key.trim().to_string()) };

    let current_db = config.database_path()?.display().to_string();
    let db = inquire::Text::new("Database path:").with_initial_value(&current_db).prompt()?;
    config.database_path = Some(PathBuf::from(db));

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
