//! Clients for the two third-party services the server re-shapes: the
//! geonames cities dataset and the weather provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    domain::{
        CityId, CityRecord, ContinentFilter, Coordinates, SortDirection, SortKey, WeatherCondition,
        WeatherSummary,
    },
    forecast::WeatherSample,
    protocol::{CityPage, CurrentWeather},
};
use thiserror::Error;

pub mod cities;
pub mod weather;

pub use cities::OpenDataSoftCities;
pub use weather::OpenWeatherMap;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("upstream responded with status {0}")]
    Status(u16),
    #[error("malformed forecast sample: {0}")]
    MalformedSample(String),
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Transport failures and non-success statuses, as opposed to payloads we
    /// could not make sense of.
    pub fn is_unavailable(&self) -> bool {
        !matches!(
            self,
            UpstreamError::MalformedSample(_) | UpstreamError::Decode(_)
        )
    }
}

/// One page request against the cities dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub continent: ContinentFilter,
}

impl CityQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[async_trait]
pub trait CitySource: Send + Sync {
    async fn query(&self, query: &CityQuery) -> Result<CityPage, UpstreamError>;
    /// Name substring match, most populous first.
    async fn search(&self, text: &str, limit: u32) -> Result<Vec<CityRecord>, UpstreamError>;
    async fn find(&self, id: &CityId) -> Result<Option<CityRecord>, UpstreamError>;
}

/// Current conditions at a coordinate, before they are tied to a city id.
#[derive(Debug, Clone)]
pub struct CurrentReport {
    pub place_name: String,
    pub condition: WeatherCondition,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: i64,
    pub humidity: i64,
    pub wind_speed: f64,
    pub wind_deg: i64,
    pub visibility: Option<i64>,
    pub cloudiness: i64,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
}

impl CurrentReport {
    pub fn summary(&self) -> WeatherSummary {
        WeatherSummary {
            main: self.condition.main.clone(),
            description: self.condition.description.clone(),
            icon: self.condition.icon.clone(),
            temp: self.temp,
            temp_min: self.temp_min,
            temp_max: self.temp_max,
        }
    }

    pub fn into_current_weather(self, city_id: CityId) -> CurrentWeather {
        CurrentWeather {
            city_id,
            place_name: self.place_name,
            condition: self.condition,
            temp: self.temp,
            feels_like: self.feels_like,
            temp_min: self.temp_min,
            temp_max: self.temp_max,
            pressure: self.pressure,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            wind_deg: self.wind_deg,
            visibility: self.visibility,
            cloudiness: self.cloudiness,
            sunrise: self.sunrise,
            sunset: self.sunset,
            observed_at: self.observed_at,
        }
    }
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, at: Coordinates) -> Result<CurrentReport, UpstreamError>;
    /// Raw 3-hour samples in provider order.
    async fn forecast_series(&self, at: Coordinates) -> Result<Vec<WeatherSample>, UpstreamError>;
}

/// Reads the body of a response, turning non-success statuses and
/// undecodable JSON into the matching `UpstreamError`.
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status(status.as_u16()));
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
