use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::WeatherError;
use crate::model::Observation;

const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the weatherapi.com `current` and `history` endpoints.
///
/// Performs no retries; the ingestion loops own the retry policy by
/// simply trying again on their next cycle or day.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new(), base_url: DEFAULT_BASE_URL.to_string() }
    }

    #[cfg(test)]
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch current conditions for `city`.
    ///
    /// `observed_at` is the provider's own `last_updated` timestamp, not
    /// local wall-clock time, so stored rows are keyed on the provider's
    /// notion of when the reading happened.
    pub async fn fetch_current(&self, city: &str) -> Result<Observation, WeatherError> {
        let url = format!("{}/current.json", self.base_url);
        let body = self.get(&url, &[("key", self.api_key.as_str()), ("q", city)]).await?;

        let parsed: WaCurrentResponse = serde_json::from_str(&body)
            .map_err(|err| WeatherError::MalformedResponse(err.to_string()))?;

        Ok(Observation {
            city: parsed.location.name,
            country: parsed.location.country,
            latitude: parsed.location.lat,
            longitude: parsed.location.lon,
            temperature: parsed.current.temp_c,
            humidity: parsed.current.humidity,
            wind_speed: parsed.current.wind_mph,
            precipitation: parsed.current.precip_mm,
            observed_at: parsed.current.last_updated,
        })
    }

    /// Fetch the day-level aggregates for one past calendar date.
    ///
    /// Maps the day's average temperature and humidity, maximum wind and
    /// total precipitation into a single observation dated `date`.
    pub async fn fetch_history_day(
        &self,
        city: &str,
        date: NaiveDate,
    ) -> Result<Observation, WeatherError> {
        let url = format!("{}/history.json", self.base_url);
        let day_param = date.format("%Y-%m-%d").to_string();
        let body = self
            .get(&url, &[("key", self.api_key.as_str()), ("q", city), ("dt", day_param.as_str())])
            .await?;

        let parsed: WaHistoryResponse = serde_json::from_str(&body)
            .map_err(|err| WeatherError::MalformedResponse(err.to_string()))?;

        let day = parsed.forecast.forecastday.into_iter().next().ok_or_else(|| {
            WeatherError::MalformedResponse(
                "history response contained no forecastday entry".to_string(),
            )
        })?;

        Ok(Observation {
            city: parsed.location.name,
            country: parsed.location.country,
            latitude: parsed.location.lat,
            longitude: parsed.location.lon,
            temperature: day.day.avgtemp_c,
            // The history endpoint reports humidity as a daily mean
            // float; the humidity column is an integer percentage.
            humidity: day.day.avghumidity.round() as i64,
            wind_speed: day.day.maxwind_mph,
            precipitation: day.day.totalprecip_mm,
            observed_at: day.date,
        })
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, WeatherError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| WeatherError::ProviderUnavailable {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            })?;

        let status = response.status();
        let body =
            response.text().await.map_err(|err| WeatherError::ProviderUnavailable {
                status: Some(status.as_u16()),
                message: err.to_string(),
            })?;

        if !status.is_success() {
            return Err(WeatherError::ProviderUnavailable {
                status: Some(status.as_u16()),
                message: format!("{status}: {}", truncate_body(&body)),
            });
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: i64,
    wind_mph: f64,
    precip_mm: f64,
    last_updated: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    avghumidity: f64,
    maxwind_mph: f64,
    totalprecip_mm: f64,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaHistoryResponse {
    location: WaLocation,
    forecast: WaForecast,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
