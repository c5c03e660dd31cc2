//! End-to-end checks against an on-disk store: rows of mixed timestamp
//! granularity flowing into the windowed queries.

use chrono::NaiveDate;
use tempfile::TempDir;
use weatherlog_core::{
    InsertOutcome, Observation, Store, Verdict, WeatherError, Window, compare_to_window,
    monthly_average,
};

fn observation(city: &str, observed_at: &str, temperature: f64) -> Observation {
    Observation {
        city: city.to_string(),
        country: "Germany".to_string(),
        latitude: 50.11,
        longitude: 8.68,
        temperature,
        humidity: 60,
        wind_speed: 5.6,
        precipitation: 0.0,
        observed_at: observed_at.to_string(),
    }
}

fn seeded_store(dir: &TempDir) -> Store {
    let store = Store::open(dir.path().join("observations.db")).unwrap();
    for (observed_at, temperature) in [
        ("2023-03-20", 25.5),
        ("2023-04-13", 27.5),
        ("2023-04-13 19:45", 27.5),
        ("2022-04-13 19:45", 45.5),
        ("2023-04-15", 35.5),
    ] {
        assert_eq!(
            store.insert(&observation("Frankfurt", observed_at, temperature)).unwrap(),
            InsertOutcome::Inserted
        );
    }
    store
}

#[test]
fn month_average_over_mixed_granularity_rows() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);

    // April 2023 has two distinct days: the 13th (mean 27.5 over two
    // samples) and the 15th (35.5). Other months and years stay out.
    assert_eq!(monthly_average(&store, "Frankfurt", 4, 2023).unwrap(), 31.5);
}

#[test]
fn comparison_uses_the_windowed_baseline() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);

    let today = NaiveDate::from_ymd_opt(2023, 4, 16).unwrap();
    let comparison = compare_to_window(&store, "Frankfurt", Window::Week, today).unwrap();

    assert_eq!(comparison.current, 35.5);
    assert_eq!(comparison.baseline, 31.5);
    assert_eq!(comparison.verdict, Verdict::Above);
}

#[test]
fn rows_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("observations.db");

    {
        let store = Store::open(&path).unwrap();
        store.insert(&observation("Frankfurt", "2023-04-15", 35.5)).unwrap();
    }

    let store = Store::open(&path).unwrap();
    let latest = store.latest("Frankfurt").unwrap().unwrap();
    assert_eq!(latest.observed_at, "2023-04-15");

    // Reopening must not make the unique key forget earlier rows.
    assert_eq!(
        store.insert(&observation("Frankfurt", "2023-04-15", 99.0)).unwrap(),
        InsertOutcome::AlreadyPresent
    );
}

#[test]
fn unknown_city_yields_no_data_everywhere() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);

    assert!(store.latest("Atlantis").unwrap().is_none());

    let err = monthly_average(&store, "Atlantis", 4, 2023).unwrap_err();
    assert!(matches!(err, WeatherError::NoData));

    let today = NaiveDate::from_ymd_opt(2023, 4, 16).unwrap();
    let err = compare_to_window(&store, "Atlantis", Window::Year, today).unwrap_err();
    assert!(matches!(err, WeatherError::NoData));
}
