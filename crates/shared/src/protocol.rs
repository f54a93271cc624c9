use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{CityId, CityRecord, ContinentFilter, SortDirection, SortKey, WeatherCondition},
    forecast::DailySummary,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MIN_SEARCH_QUERY_CHARS: usize = 2;

/// Query string of `GET /api/cities`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCitiesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<ContinentFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_weather: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityPage {
    pub cities: Vec<CityRecord>,
    pub has_next: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchCitiesQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city_id: CityId,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<i64>,
    pub cloudiness: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub daily: Vec<DailySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub city_id: String,
    pub city_name: String,
    pub country_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFavoriteRequest {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}
