use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared::{
    domain::{CityId, CityRecord, Favorite},
    error::ApiError,
    forecast::DailySummary,
    protocol::{
        AddFavoriteRequest, CityPage, CurrentWeather, FavoriteStatus, ForecastResponse,
        ToggleFavoriteRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::{CityQuerySource, ClientError, FavoritesStore, ListQuery, WeatherDataSource};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client of the weather browser server.
#[derive(Clone)]
pub struct WeatherApiClient {
    http: reqwest::Client,
    base_url: Url,
    annotate_weather: bool,
}

impl WeatherApiClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(server_url)
            .map_err(|e| ClientError::Validation(format!("invalid server url '{server_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Validation(format!(
                "server url '{server_url}' cannot carry paths"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            annotate_weather: false,
        })
    }

    /// Asks the server to attach a weather summary to every listed city.
    pub fn with_weather_annotation(mut self, annotate: bool) -> Self {
        self.annotate_weather = annotate;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.json::<ApiError>().await.ok();
        debug!(%status, ?body, "server returned an error");
        Err(ClientError::from_response(status, body))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.endpoint(segments))
            .query(query)
            .send()
            .await?;
        Self::read(response).await
    }
}

#[async_trait]
impl CityQuerySource for WeatherApiClient {
    async fn query_cities(&self, query: &ListQuery, limit: u32) -> Result<CityPage, ClientError> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("limit", limit.to_string()),
            ("sort_by", query.sort_key.as_str().to_string()),
            ("sort_order", query.direction.as_str().to_string()),
            ("continent", query.continent.to_string()),
        ];
        if self.annotate_weather {
            params.push(("with_weather", "true".to_string()));
        }
        self.get_json(&["api", "cities"], &params).await
    }

    async fn search_cities(&self, text: &str, limit: u32) -> Result<Vec<CityRecord>, ClientError> {
        self.get_json(
            &["api", "cities", "search"],
            &[("q", text.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

#[async_trait]
impl WeatherDataSource for WeatherApiClient {
    async fn city(&self, id: &CityId) -> Result<CityRecord, ClientError> {
        self.get_json(&["api", "cities", id.as_str()], &[]).await
    }

    async fn current_weather(&self, id: &CityId) -> Result<CurrentWeather, ClientError> {
        self.get_json(&["api", "weather", "current", id.as_str()], &[])
            .await
    }

    async fn forecast(&self, id: &CityId) -> Result<Vec<DailySummary>, ClientError> {
        let response: ForecastResponse = self
            .get_json(&["api", "weather", "forecast", id.as_str()], &[])
            .await?;
        Ok(response.daily)
    }
}

#[async_trait]
impl FavoritesStore for WeatherApiClient {
    async fn add(
        &self,
        city_id: &CityId,
        name: &str,
        country: &str,
    ) -> Result<Favorite, ClientError> {
        let response = self
            .http
            .put(self.endpoint(&["api", "favorites", city_id.as_str()]))
            .json(&AddFavoriteRequest {
                name: name.to_string(),
                country: country.to_string(),
            })
            .send()
            .await?;
        Self::read(response).await
    }

    async fn remove(&self, city_id: &CityId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.endpoint(&["api", "favorites", city_id.as_str()]))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.json::<ApiError>().await.ok();
        Err(ClientError::from_response(status, body))
    }

    async fn list(&self) -> Result<Vec<Favorite>, ClientError> {
        self.get_json(&["api", "favorites"], &[]).await
    }

    async fn is_favorite(&self, city_id: &CityId) -> Result<bool, ClientError> {
        let status: FavoriteStatus = self
            .get_json(&["api", "favorites", city_id.as_str()], &[])
            .await?;
        Ok(status.is_favorite)
    }

    async fn toggle(
        &self,
        city_id: &CityId,
        name: &str,
        country: &str,
    ) -> Result<bool, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "favorites"]))
            .json(&ToggleFavoriteRequest {
                city_id: city_id.to_string(),
                city_name: name.to_string(),
                country_name: country.to_string(),
            })
            .send()
            .await?;
        let status: FavoriteStatus = Self::read(response).await?;
        Ok(status.is_favorite)
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
