use serde::{Deserialize, Serialize};

/// One normalized weather observation for a city at a point in time.
///
/// `observed_at` is the provider's own timestamp, either `YYYY-MM-DD`
/// (history endpoint) or `YYYY-MM-DD HH:MM` (current endpoint). Both
/// formats sort lexicographically in chronological order, which the
/// store relies on for `latest` and the windowed queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Integer percentage.
    pub humidity: i64,
    /// Stored verbatim in the provider's native unit, no conversion.
    pub wind_speed: f64,
    pub precipitation: f64,
    pub observed_at: String,
}

/// Result of an idempotent store insert.
///
/// `AlreadyPresent` is the expected dedup signal, not an error: a second
/// write for the same (city, observed_at) pair leaves the first row
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}
