use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{
    add_favorite, current_weather, favorite_status, get_city, list_cities, list_favorites,
    remove_favorite, search_cities, toggle_favorite, weather_forecast, weather_summary,
    ApiContext,
};
use shared::{
    domain::{CityId, CityRecord, Favorite, WeatherSummary},
    error::{ApiError, ErrorCode},
    protocol::{
        AddFavoriteRequest, CityPage, CurrentWeather, FavoriteStatus, ForecastResponse,
        ListCitiesQuery, SearchCitiesQuery, ToggleFavoriteRequest,
    },
};
use storage::{Storage, DEFAULT_FAVORITES};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use upstream::{OpenDataSoftCities, OpenWeatherMap};

mod config;

use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 16 * 1024;

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    if settings.seed_favorites {
        storage.seed_favorites(&DEFAULT_FAVORITES).await?;
    }

    let timeout = Duration::from_secs(settings.upstream_timeout_secs);
    let cities = OpenDataSoftCities::new(&settings.cities_api_url, timeout)?;
    let weather = OpenWeatherMap::new(
        &settings.weather_api_url,
        settings.openweather_api_key.clone(),
        timeout,
    )?;
    let api = ApiContext {
        storage,
        cities: Arc::new(cities),
        weather: Arc::new(weather),
    };

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, cities = %settings.cities_api_url, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/cities", get(http_list_cities))
        .route("/api/cities/search", get(http_search_cities))
        .route("/api/cities/:id", get(http_get_city))
        .route("/api/weather/current/:city_id", get(http_current_weather))
        .route("/api/weather/forecast/:city_id", get(http_weather_forecast))
        .route("/api/weather/summary/:city_id", get(http_weather_summary))
        .route(
            "/api/favorites",
            get(http_list_favorites).post(http_toggle_favorite),
        )
        .route(
            "/api/favorites/:city_id",
            get(http_favorite_status)
                .put(http_add_favorite)
                .delete(http_remove_favorite),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(err.code);
    if status.is_server_error() {
        warn!(%status, message = %err.message, "request failed");
    }
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_cities(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListCitiesQuery>,
) -> HttpResult<Json<CityPage>> {
    let page = list_cities(&state.api, q).await.map_err(api_error)?;
    Ok(Json(page))
}

async fn http_search_cities(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SearchCitiesQuery>,
) -> HttpResult<Json<Vec<CityRecord>>> {
    let cities = search_cities(&state.api, q).await.map_err(api_error)?;
    Ok(Json(cities))
}

async fn http_get_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HttpResult<Json<CityRecord>> {
    let city = get_city(&state.api, &CityId(id))
        .await
        .map_err(api_error)?;
    Ok(Json(city))
}

async fn http_current_weather(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> HttpResult<Json<CurrentWeather>> {
    let current = current_weather(&state.api, &CityId(city_id))
        .await
        .map_err(api_error)?;
    Ok(Json(current))
}

async fn http_weather_forecast(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> HttpResult<Json<ForecastResponse>> {
    let forecast = weather_forecast(&state.api, &CityId(city_id))
        .await
        .map_err(api_error)?;
    Ok(Json(forecast))
}

async fn http_weather_summary(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> HttpResult<Json<WeatherSummary>> {
    let summary = weather_summary(&state.api, &CityId(city_id))
        .await
        .map_err(api_error)?;
    Ok(Json(summary))
}

async fn http_list_favorites(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<Favorite>>> {
    let favorites = list_favorites(&state.api).await.map_err(api_error)?;
    Ok(Json(favorites))
}

async fn http_toggle_favorite(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleFavoriteRequest>,
) -> HttpResult<Json<FavoriteStatus>> {
    let status = toggle_favorite(&state.api, req)
        .await
        .map_err(api_error)?;
    Ok(Json(status))
}

async fn http_add_favorite(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
    Json(req): Json<AddFavoriteRequest>,
) -> HttpResult<Json<Favorite>> {
    let favorite = add_favorite(&state.api, &CityId(city_id), req)
        .await
        .map_err(api_error)?;
    Ok(Json(favorite))
}

async fn http_remove_favorite(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> HttpResult<StatusCode> {
    remove_favorite(&state.api, &CityId(city_id))
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_favorite_status(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> HttpResult<Json<FavoriteStatus>> {
    let status = favorite_status(&state.api, &CityId(city_id))
        .await
        .map_err(api_error)?;
    Ok(Json(status))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
