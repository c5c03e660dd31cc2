use chrono::NaiveDate;
use std::convert::TryFrom;

use crate::error::WeatherError;
use crate::store::Store;

/// Named lookback period for comparison queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Week,
    Month,
    Year,
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Week => "week",
            Window::Month => "month",
            Window::Year => "year",
        }
    }

    pub const fn all() -> &'static [Window] {
        &[Window::Week, Window::Month, Window::Year]
    }

    pub fn lookback_days(&self) -> i64 {
        match self {
            Window::Week => 7,
            Window::Month => 30,
            Window::Year => 365,
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Window {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "week" => Ok(Window::Week),
            "month" => Ok(Window::Month),
            "year" => Ok(Window::Year),
            _ => Err(anyhow::anyhow!(
                "Unknown window '{value}'. Supported windows: week, month, year."
            )),
        }
    }
}

/// How the latest reading relates to the windowed baseline.
///
/// `Equal` uses exact float equality, matching the stored values bit
/// for bit rather than applying a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Above,
    Below,
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowComparison {
    pub current: f64,
    pub baseline: f64,
    pub verdict: Verdict,
}

/// Compare the latest stored temperature for `city` against the grouped
/// average over the window's lookback ending at `today`.
///
/// `today` comes from the caller so queries are reproducible; the CLI
/// passes the local calendar date. Fails with `NoData` when either the
/// latest reading or the baseline is absent.
pub fn compare_to_window(
    store: &Store,
    city: &str,
    window: Window,
    today: NaiveDate,
) -> Result<WindowComparison, WeatherError> {
    let since = today - chrono::Duration::days(window.lookback_days());

    let baseline = store.daily_grouped_average(city, since)?.ok_or(WeatherError::NoData)?;
    let latest = store.latest(city)?.ok_or(WeatherError::NoData)?;
    let current = latest.temperature;

    let verdict = if current > baseline {
        Verdict::Above
    } else if current < baseline {
        Verdict::Below
    } else {
        Verdict::Equal
    };

    Ok(WindowComparison { current, baseline, verdict })
}

/// Grouped average temperature for one (month, year).
pub fn monthly_average(
    store: &Store,
    city: &str,
    month: u32,
    year: i32,
) -> Result<f64, WeatherError> {
    store.month_year_average(city, month, year)?.ok_or(WeatherError::NoData)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

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

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 4, 16).unwrap()
    }

    #[test]
    fn window_as_str_roundtrip() {
        for window in Window::all() {
            let s = window.as_str();
            let parsed = Window::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*window, parsed);
        }
    }

    #[test]
    fn unknown_window_error() {
        let err = Window::try_from("fortnight").unwrap_err();
        assert!(err.to_string().contains("Unknown window"));
    }

    #[test]
    fn lookbacks_match_the_named_periods() {
        assert_eq!(Window::Week.lookback_days(), 7);
        assert_eq!(Window::Month.lookback_days(), 30);
        assert_eq!(Window::Year.lookback_days(), 365);
    }

    #[test]
    fn latest_above_the_baseline() {
        let store = Store::in_memory().unwrap();
        store.insert(&observation("Frankfurt", "2023-04-13", 27.5)).unwrap();
        store.insert(&observation("Frankfurt", "2023-04-15", 35.5)).unwrap();

        let comparison = compare_to_window(&store, "Frankfurt", Window::Week, today()).unwrap();

        assert_eq!(comparison.current, 35.5);
        assert_eq!(comparison.baseline, 31.5);
        assert_eq!(comparison.verdict, Verdict::Above);
    }

    #[test]
    fn latest_below_the_baseline() {
        let store = Store::in_memory().unwrap();
        store.insert(&observation("Frankfurt", "2023-04-13", 35.5)).unwrap();
        store.insert(&observation("Frankfurt", "2023-04-15", 27.5)).unwrap();

        let comparison = compare_to_window(&store, "Frankfurt", Window::Week, today()).unwrap();

        assert_eq!(comparison.verdict, Verdict::Below);
        assert_eq!(comparison.current, 27.5);
    }

    #[test]
    fn equal_requires_exact_match() {
        let store = Store::in_memory().unwrap();
        store.insert(&observation("Frankfurt", "2023-04-15", 27.5)).unwrap();

        // One row: the baseline is that row's own day average.
        let comparison = compare_to_window(&store, "Frankfurt", Window::Week, today()).unwrap();

        assert_eq!(comparison.verdict, Verdict::Equal);
        assert_eq!(comparison.current, comparison.baseline);
    }

    #[test]
    fn no_data_when_nothing_is_stored() {
        let store = Store::in_memory().unwrap();
        let err = compare_to_window(&store, "Frankfurt", Window::Week, today()).unwrap_err();

        assert!(matches!(err, WeatherError::NoData));
    }

    #[test]
    fn no_data_when_all_rows_predate_the_window() {
        let store = Store::in_memory().unwrap();
        store.insert(&observation("Frankfurt", "2022-04-13", 27.5)).unwrap();

        let err = compare_to_window(&store, "Frankfurt", Window::Week, today()).unwrap_err();
        assert!(matches!(err, WeatherError::NoData));
    }

    #[test]
    fn monthly_average_passes_through_the_store_value() {
        let store = Store::in_memory().unwrap();
        store.insert(&observation("Frankfurt", "2023-04-13", 27.5)).unwrap();
        store.insert(&observation("Frankfurt", "2023-04-15", 35.5)).unwrap();

        assert_eq!(monthly_average(&store, "Frankfurt", 4, 2023).unwrap(), 31.5);
    }

    #[test]
    fn monthly_average_is_no_data_for_an_empty_month() {
        let store = Store::in_memory().unwrap();
        store.insert(&observation("Frankfurt", "2023-04-13", 27.5)).unwrap();

        let err = monthly_average(&store, "Frankfurt", 7, 2023).unwrap_err();
        assert!(matches!(err, WeatherError::NoData));
    }
}
