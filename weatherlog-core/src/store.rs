//! SQLite-backed observation store.
//!
//! Enforces one row per (city, observed_at) and answers the windowed
//! aggregation queries the CLI exposes. Rows are immutable once stored;
//! there is no update or delete path.

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::path::Path;

use crate::error::WeatherError;
use crate::model::{InsertOutcome, Observation};

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the observations database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WeatherError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, WeatherError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), WeatherError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY,
                city TEXT NOT NULL,
                country TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                temperature REAL NOT NULL,
                humidity INTEGER NOT NULL,
                wind_speed REAL NOT NULL,
                precipitation REAL NOT NULL,
                observed_at TEXT NOT NULL,
                UNIQUE (city, observed_at)
            );

            CREATE INDEX IF NOT EXISTS idx_observations_city_time
                ON observations(city, observed_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// Idempotent insert keyed on (city, observed_at).
    ///
    /// First writer wins: a duplicate key reports `AlreadyPresent` and
    /// never overwrites the stored row. The single INSERT OR IGNORE
    /// statement is atomic, so concurrent inserts of the same key
    /// resolve to exactly one row.
    pub fn insert(&self, observation: &Observation) -> Result<InsertOutcome, WeatherError> {
        let changed = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO observations
            (city, country, latitude, longitude, temperature, humidity,
             wind_speed, precipitation, observed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                observation.city,
                observation.country,
                observation.latitude,
                observation.longitude,
                observation.temperature,
                observation.humidity,
                observation.wind_speed,
                observation.precipitation,
                observation.observed_at,
            ],
        )?;

        Ok(if changed == 0 { InsertOutcome::AlreadyPresent } else { InsertOutcome::Inserted })
    }

    /// The observation with the maximum `observed_at` for a city.
    ///
    /// Lexicographic ordering of the stored timestamp strings equals
    /// chronological ordering for the two fixed formats.
    pub fn latest(&self, city: &str) -> Result<Option<Observation>, WeatherError> {
        let mut stmt = self.conn.prepare(
            "SELECT city, country, latitude, longitude, temperature, humidity,
                    wind_speed, precipitation, observed_at
             FROM observations
             WHERE city = ?1
             ORDER BY observed_at DESC
             LIMIT 1",
        )?;

        let mut rows = stmt.query(params![city])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_observation(row)?))
        } else {
            Ok(None)
        }
    }

    /// Average temperature over rows observed on or after `since`,
    /// grouped by day-of-month: per-day means first, then the mean of
    /// those means. Days with more intraday samples do not dominate.
    ///
    /// `None` when no rows match, which callers must keep distinct from
    /// an average of zero.
    pub fn daily_grouped_average(
        &self,
        city: &str,
        since: NaiveDate,
    ) -> Result<Option<f64>, WeatherError> {
        let average = self.conn.query_row(
            r#"
            SELECT AVG(day_avg) FROM (
                SELECT AVG(temperature) AS day_avg
                FROM observations
                WHERE city = ?1 AND date(observed_at) >= ?2
                GROUP BY strftime('%d', observed_at)
            )
            "#,
            params![city, since.format("%Y-%m-%d").to_string()],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(average)
    }

    /// Same two-level aggregation, restricted to one calendar month of
    /// one year.
    pub fn month_year_average(
        &self,
        city: &str,
        month: u32,
        year: i32,
    ) -> Result<Option<f64>, WeatherError> {
        let average = self.conn.query_row(
            r#"
            SELECT AVG(day_avg) FROM (
                SELECT AVG(temperature) AS day_avg
                FROM observations
                WHERE city = ?1
                  AND strftime('%m', observed_at) = ?2
                  AND strftime('%Y', observed_at) = ?3
                GROUP BY strftime('%d', observed_at)
            )
            "#,
            params![city, format!("{month:02}"), format!("{year:04}")],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(average)
    }

    fn row_to_observation(row: &rusqlite::Row) -> rusqlite::Result<Observation> {
        Ok(Observation {
            city: row.get(0)?,
            country: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            temperature: row.get(4)?,
            humidity: row.get(5)?,
            wind_speed: row.get(6)?,
            precipitation: row.get(7)?,
            observed_at: row.get(8)?,
        })
    }
}
