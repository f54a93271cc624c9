//! Client side of the weather browser: the HTTP client of the server and the
//! state machines the terminal shell drives.

use async_trait::async_trait;
use shared::{
    domain::{CityId, CityRecord, ContinentFilter, Favorite, SortDirection, SortKey},
    forecast::DailySummary,
    protocol::{CityPage, CurrentWeather},
};

pub mod detail;
pub mod error;
pub mod format;
pub mod http;
pub mod list_controller;
pub mod search;
pub mod settings;

pub use detail::{load_city_detail, CityDetail};
pub use error::ClientError;
pub use http::WeatherApiClient;
pub use list_controller::ListController;
pub use search::CitySearch;
pub use settings::{Settings, SettingsStore};

/// Page request issued by the list controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub continent: ContinentFilter,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            continent: ContinentFilter::default(),
        }
    }
}

#[async_trait]
pub trait CityQuerySource: Send + Sync {
    async fn query_cities(&self, query: &ListQuery, limit: u32) -> Result<CityPage, ClientError>;
    async fn search_cities(&self, text: &str, limit: u32) -> Result<Vec<CityRecord>, ClientError>;
}

#[async_trait]
pub trait WeatherDataSource: Send + Sync {
    async fn city(&self, id: &CityId) -> Result<CityRecord, ClientError>;
    async fn current_weather(&self, id: &CityId) -> Result<CurrentWeather, ClientError>;
    async fn forecast(&self, id: &CityId) -> Result<Vec<DailySummary>, ClientError>;
}

#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn add(&self, city_id: &CityId, name: &str, country: &str)
        -> Result<Favorite, ClientError>;
    async fn remove(&self, city_id: &CityId) -> Result<(), ClientError>;
    /// Most recently added first.
    async fn list(&self) -> Result<Vec<Favorite>, ClientError>;
    async fn is_favorite(&self, city_id: &CityId) -> Result<bool, ClientError>;
    /// Returns the state after the toggle.
    async fn toggle(&self, city_id: &CityId, name: &str, country: &str)
        -> Result<bool, ClientError>;
}
