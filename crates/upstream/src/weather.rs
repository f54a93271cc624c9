use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use shared::{
    domain::{Coordinates, WeatherCondition},
    forecast::WeatherSample,
};
use tracing::debug;
use url::Url;

use crate::{decode_json, CurrentReport, UpstreamError, WeatherSource};

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";
const SAMPLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct OpenWeatherMap {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    main: String,
    description: String,
    #[serde(default)]
    icon: String,
}

impl From<RawCondition> for WeatherCondition {
    fn from(raw: RawCondition) -> Self {
        WeatherCondition {
            main: raw.main,
            description: raw.description,
            icon: raw.icon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    #[serde(default)]
    pressure: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawClouds {
    #[serde(default)]
    all: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawSys {
    #[serde(default)]
    sunrise: Option<i64>,
    #[serde(default)]
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    weather: Vec<RawCondition>,
    main: RawMain,
    #[serde(default)]
    visibility: Option<i64>,
    #[serde(default)]
    wind: RawWind,
    #[serde(default)]
    clouds: RawClouds,
    #[serde(default)]
    sys: RawSys,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    #[serde(default)]
    list: Vec<RawSample>,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    dt_txt: String,
    main: RawMain,
    #[serde(default)]
    weather: Vec<RawCondition>,
    #[serde(default)]
    wind: RawWind,
    #[serde(default)]
    pop: f64,
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

impl RawCurrent {
    fn into_report(self) -> Result<CurrentReport, UpstreamError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .map(WeatherCondition::from)
            .ok_or_else(|| UpstreamError::Decode("current weather has no condition".into()))?;
        let observed_at = timestamp(self.dt)
            .ok_or_else(|| UpstreamError::Decode(format!("invalid observation time {}", self.dt)))?;

        Ok(CurrentReport {
            place_name: self.name,
            condition,
            temp: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            pressure: self.main.pressure.round() as i64,
            humidity: self.main.humidity.round() as i64,
            wind_speed: self.wind.speed,
            wind_deg: self.wind.deg.round() as i64,
            visibility: self.visibility,
            cloudiness: self.clouds.all.round() as i64,
            sunrise: self.sys.sunrise.and_then(timestamp),
            sunset: self.sys.sunset.and_then(timestamp),
            observed_at,
        })
    }
}

impl RawSample {
    fn into_sample(self) -> Result<WeatherSample, UpstreamError> {
        let timestamp = NaiveDateTime::parse_from_str(&self.dt_txt, SAMPLE_TIME_FORMAT)
            .map_err(|e| UpstreamError::MalformedSample(format!("dt_txt '{}': {e}", self.dt_txt)))?;
        let condition = self
            .weather
            .into_iter()
            .next()
            .map(WeatherCondition::from)
            .ok_or_else(|| {
                UpstreamError::MalformedSample(format!("sample at {} has no condition", self.dt_txt))
            })?;

        Ok(WeatherSample {
            timestamp,
            temp_max: self.main.temp_max,
            temp_min: self.main.temp_min,
            condition,
            pop: self.pop,
            humidity: self.main.humidity.round() as i64,
            wind_speed: self.wind.speed,
        })
    }
}

impl OpenWeatherMap {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        // a trailing slash keeps Url::join from dropping the last path segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| UpstreamError::Unavailable(format!("invalid weather url: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        at: Coordinates,
    ) -> Result<T, UpstreamError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| UpstreamError::Unavailable(format!("invalid weather endpoint: {e}")))?;
        debug!(%url, lat = at.lat, lon = at.lon, "weather: fetching");
        let response = self
            .http
            .get(url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;
        decode_json(response).await
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherMap {
    async fn current(&self, at: Coordinates) -> Result<CurrentReport, UpstreamError> {
        let raw: RawCurrent = self.fetch("weather", at).await?;
        raw.into_report()
    }

    async fn forecast_series(&self, at: Coordinates) -> Result<Vec<WeatherSample>, UpstreamError> {
        let raw: RawForecast = self.fetch("forecast", at).await?;
        raw.list.into_iter().map(RawSample::into_sample).collect()
    }
}

#[cfg(test)]
#[path = "tests/weather_tests.rs"]
mod tests;
