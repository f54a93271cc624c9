use shared::{
    domain::{CityId, CityRecord},
    forecast::DailySummary,
    protocol::CurrentWeather,
};

use crate::{ClientError, FavoritesStore, WeatherDataSource};

/// Everything the detail view of one city shows.
#[derive(Debug, Clone)]
pub struct CityDetail {
    pub city: CityRecord,
    pub current: CurrentWeather,
    pub forecast: Vec<DailySummary>,
    pub is_favorite: bool,
}

/// Fetches the city, its weather, its forecast and its favorite flag
/// concurrently. The first failure wins.
pub async fn load_city_detail(
    weather: &dyn WeatherDataSource,
    favorites: &dyn FavoritesStore,
    id: &CityId,
) -> Result<CityDetail, ClientError> {
    let (city, current, forecast, is_favorite) = tokio::try_join!(
        weather.city(id),
        weather.current_weather(id),
        weather.forecast(id),
        favorites.is_favorite(id),
    )?;
    Ok(CityDetail {
        city,
        current,
        forecast,
        is_favorite,
    })
}
