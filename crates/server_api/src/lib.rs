use std::sync::Arc;

use futures::future::join_all;
use shared::{
    domain::{CityId, CityRecord, Favorite, WeatherSummary},
    error::{ApiError, ErrorCode},
    forecast::aggregate,
    protocol::{
        AddFavoriteRequest, CityPage, CurrentWeather, FavoriteStatus, ForecastResponse,
        ListCitiesQuery, SearchCitiesQuery, ToggleFavoriteRequest, DEFAULT_PAGE_SIZE,
        DEFAULT_SEARCH_LIMIT, MAX_PAGE_SIZE, MIN_SEARCH_QUERY_CHARS,
    },
};
use storage::Storage;
use tracing::{debug, warn};
use upstream::{CityQuery, CitySource, UpstreamError, WeatherSource};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub cities: Arc<dyn CitySource>,
    pub weather: Arc<dyn WeatherSource>,
}

pub async fn list_cities(ctx: &ApiContext, query: ListCitiesQuery) -> Result<CityPage, ApiError> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::validation("page starts at 1"));
    }
    let city_query = CityQuery {
        page,
        limit: query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
        sort_key: query.sort_by.unwrap_or_default(),
        direction: query.sort_order.unwrap_or_default(),
        continent: query.continent.unwrap_or_default(),
    };

    let mut result = ctx.cities.query(&city_query).await.map_err(upstream)?;
    if query.with_weather.unwrap_or(false) {
        annotate_weather(ctx, &mut result.cities).await;
    }
    Ok(result)
}

/// Attaches a weather summary to each record, concurrently. Lookups that fail
/// leave the record without weather.
async fn annotate_weather(ctx: &ApiContext, cities: &mut [CityRecord]) {
    let lookups = cities
        .iter()
        .map(|city| ctx.weather.current(city.coordinates));
    let reports = join_all(lookups).await;

    for (city, report) in cities.iter_mut().zip(reports) {
        match report {
            Ok(report) => city.weather = Some(report.summary()),
            Err(err) => {
                debug!(city_id = %city.id, error = %err, "weather annotation skipped");
            }
        }
    }
}

pub async fn search_cities(
    ctx: &ApiContext,
    query: SearchCitiesQuery,
) -> Result<Vec<CityRecord>, ApiError> {
    let text = query.q.as_deref().unwrap_or_default().trim();
    if text.chars().count() < MIN_SEARCH_QUERY_CHARS {
        return Err(ApiError::validation(format!(
            "search query must have at least {MIN_SEARCH_QUERY_CHARS} characters"
        )));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_PAGE_SIZE);
    ctx.cities.search(text, limit).await.map_err(upstream)
}

pub async fn get_city(ctx: &ApiContext, city_id: &CityId) -> Result<CityRecord, ApiError> {
    ensure_id(city_id)?;
    if !city_id.is_geoname() {
        return Err(ApiError::not_found(format!("city {city_id} not found")));
    }
    ctx.cities
        .find(city_id)
        .await
        .map_err(upstream)?
        .ok_or_else(|| ApiError::not_found(format!("city {city_id} not found")))
}

pub async fn current_weather(
    ctx: &ApiContext,
    city_id: &CityId,
) -> Result<CurrentWeather, ApiError> {
    let city = get_city(ctx, city_id).await?;
    let report = ctx
        .weather
        .current(city.coordinates)
        .await
        .map_err(upstream)?;
    Ok(report.into_current_weather(city.id))
}

pub async fn weather_forecast(
    ctx: &ApiContext,
    city_id: &CityId,
) -> Result<ForecastResponse, ApiError> {
    let city = get_city(ctx, city_id).await?;
    let samples = ctx
        .weather
        .forecast_series(city.coordinates)
        .await
        .map_err(upstream)?;
    Ok(ForecastResponse {
        daily: aggregate(&samples),
    })
}

pub async fn weather_summary(
    ctx: &ApiContext,
    city_id: &CityId,
) -> Result<WeatherSummary, ApiError> {
    let city = get_city(ctx, city_id).await?;
    let report = ctx
        .weather
        .current(city.coordinates)
        .await
        .map_err(upstream)?;
    Ok(report.summary())
}

pub async fn list_favorites(ctx: &ApiContext) -> Result<Vec<Favorite>, ApiError> {
    ctx.storage.list_favorites().await.map_err(internal)
}

pub async fn toggle_favorite(
    ctx: &ApiContext,
    request: ToggleFavoriteRequest,
) -> Result<FavoriteStatus, ApiError> {
    let city_id = CityId::new(request.city_id.trim());
    ensure_id(&city_id)?;
    let name = required("city_name", &request.city_name)?;
    let country = required("country_name", &request.country_name)?;

    let is_favorite = ctx
        .storage
        .toggle_favorite(&city_id, name, country)
        .await
        .map_err(internal)?;
    Ok(FavoriteStatus { is_favorite })
}

pub async fn add_favorite(
    ctx: &ApiContext,
    city_id: &CityId,
    request: AddFavoriteRequest,
) -> Result<Favorite, ApiError> {
    ensure_id(city_id)?;
    let name = required("name", &request.name)?;
    let country = required("country", &request.country)?;
    ctx.storage
        .add_favorite(city_id, name, country)
        .await
        .map_err(internal)
}

/// Removing a city that is not a favorite succeeds.
pub async fn remove_favorite(ctx: &ApiContext, city_id: &CityId) -> Result<(), ApiError> {
    ensure_id(city_id)?;
    let removed = ctx
        .storage
        .remove_favorite(city_id)
        .await
        .map_err(internal)?;
    if !removed {
        debug!(%city_id, "remove_favorite: city was not a favorite");
    }
    Ok(())
}

pub async fn favorite_status(
    ctx: &ApiContext,
    city_id: &CityId,
) -> Result<FavoriteStatus, ApiError> {
    ensure_id(city_id)?;
    let is_favorite = ctx
        .storage
        .is_favorite(city_id)
        .await
        .map_err(internal)?;
    Ok(FavoriteStatus { is_favorite })
}

fn ensure_id(city_id: &CityId) -> Result<(), ApiError> {
    if city_id.as_str().trim().is_empty() {
        return Err(ApiError::validation("city id must not be empty"));
    }
    Ok(())
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    Ok(value)
}

fn upstream(err: UpstreamError) -> ApiError {
    if err.is_unavailable() {
        warn!(error = %err, "upstream request failed");
        ApiError::upstream(err.to_string())
    } else {
        warn!(error = %err, "upstream payload rejected");
        ApiError::new(ErrorCode::Internal, err.to_string())
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}
