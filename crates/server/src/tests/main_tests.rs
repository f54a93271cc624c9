use super::*;
use async_trait::async_trait;
use axum::{body, body::Body, http::Request, response::Response};
use chrono::{NaiveDateTime, Utc};
use serde_json::{json, Value};
use shared::{
    domain::{Coordinates, WeatherCondition},
    forecast::WeatherSample,
};
use tower::ServiceExt;
use upstream::{CityQuery, CitySource, CurrentReport, UpstreamError, WeatherSource};

struct StubCities {
    down: bool,
}

fn berlin() -> CityRecord {
    CityRecord {
        id: CityId::new("2950159"),
        name: "Berlin".to_string(),
        country: "Germany".to_string(),
        timezone: "Europe/Berlin".to_string(),
        population: 3426354,
        coordinates: Coordinates {
            lat: 52.52,
            lon: 13.41,
        },
        weather: None,
    }
}

#[async_trait]
impl CitySource for StubCities {
    async fn query(&self, query: &CityQuery) -> Result<CityPage, UpstreamError> {
        if self.down {
            return Err(UpstreamError::Status(503));
        }
        Ok(CityPage {
            cities: vec![berlin()],
            has_next: query.page < 2,
        })
    }

    async fn search(&self, _text: &str, _limit: u32) -> Result<Vec<CityRecord>, UpstreamError> {
        Ok(vec![berlin()])
    }

    async fn find(&self, id: &CityId) -> Result<Option<CityRecord>, UpstreamError> {
        // The dataset rejects malformed where clauses outright.
        if !id.as_str().bytes().all(|b| b.is_ascii_digit()) {
            return Err(UpstreamError::Status(400));
        }
        Ok((id.as_str() == "2950159").then(berlin))
    }
}

struct StubWeather;

fn clouds() -> WeatherCondition {
    WeatherCondition {
        main: "Clouds".to_string(),
        description: "broken clouds".to_string(),
        icon: "04d".to_string(),
    }
}

#[async_trait]
impl WeatherSource for StubWeather {
    async fn current(&self, _at: Coordinates) -> Result<CurrentReport, UpstreamError> {
        Ok(CurrentReport {
            place_name: "Berlin".to_string(),
            condition: clouds(),
            temp: 17.2,
            feels_like: 16.8,
            temp_min: 15.0,
            temp_max: 19.0,
            pressure: 1009,
            humidity: 66,
            wind_speed: 3.6,
            wind_deg: 250,
            visibility: Some(10000),
            cloudiness: 75,
            sunrise: None,
            sunset: None,
            observed_at: Utc::now(),
        })
    }

    async fn forecast_series(&self, _at: Coordinates) -> Result<Vec<WeatherSample>, UpstreamError> {
        let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("ts");
        Ok(vec![
            WeatherSample {
                timestamp: at("2024-06-05 12:00:00"),
                temp_max: 20.0,
                temp_min: 14.0,
                condition: clouds(),
                pop: 0.2,
                humidity: 60,
                wind_speed: 3.0,
            },
            WeatherSample {
                timestamp: at("2024-06-05 15:00:00"),
                temp_max: 22.0,
                temp_min: 15.0,
                condition: clouds(),
                pop: 0.4,
                humidity: 70,
                wind_speed: 5.0,
            },
        ])
    }
}

async fn test_app(cities_down: bool) -> Router {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext {
        storage,
        cities: Arc::new(StubCities { down: cities_down }),
        weather: Arc::new(StubWeather),
    };
    build_router(Arc::new(AppState { api }))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("response")
}

async fn json_body(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn with_json(method: &str, uri: &str, payload: Value) -> Request<Body> {
    let raw = payload.to_string();
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("content-length", raw.len())
        .body(Body::from(raw))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app(false).await;
    let response = send(&app, get("/healthz")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn lists_cities_with_weather_annotation() {
    let app = test_app(false).await;
    let response = send(
        &app,
        get("/api/cities?page=1&limit=20&sort_by=population&sort_order=desc&continent=Europe&with_weather=true"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["has_next"], json!(true));
    assert_eq!(body["cities"][0]["name"], "Berlin");
    assert_eq!(body["cities"][0]["weather"]["main"], "Clouds");
}

#[tokio::test]
async fn unknown_sort_key_is_a_bad_request() {
    let app = test_app(false).await;
    let response = send(&app, get("/api/cities?sort_by=altitude")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_outage_maps_to_bad_gateway() {
    let app = test_app(true).await;
    let response = send(&app, get("/api/cities")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["code"], "upstream_unavailable");
}

#[tokio::test]
async fn search_validates_query_length() {
    let app = test_app(false).await;
    let response = send(&app, get("/api/cities/search?q=b")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "validation");

    let response = send(&app, get("/api/cities/search?q=ber")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await[0]["id"], "2950159");
}

#[tokio::test]
async fn city_and_weather_routes_resolve_by_id() {
    let app = test_app(false).await;

    let response = send(&app, get("/api/cities/2950159")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/api/cities/1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/api/weather/current/2950159")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["city_id"], "2950159");
    assert_eq!(body["humidity"], 66);

    let response = send(&app, get("/api/weather/summary/2950159")).await;
    assert_eq!(json_body(response).await["temp"], json!(17.2));

    let response = send(&app, get("/api/weather/forecast/1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_city_id_is_not_found() {
    let app = test_app(false).await;

    for uri in [
        "/api/cities/abc",
        "/api/cities/1%20OR%20population%3E0",
        "/api/weather/current/abc",
        "/api/weather/forecast/-7",
    ] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json_body(response).await["code"], "not_found", "{uri}");
    }
}

#[tokio::test]
async fn forecast_route_returns_daily_summaries() {
    let app = test_app(false).await;
    let response = send(&app, get("/api/weather/forecast/2950159")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let daily = body["daily"].as_array().expect("daily");
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0]["date"], "2024-06-05");
    assert_eq!(daily[0]["day_name"], "Wed");
    assert_eq!(daily[0]["temp_max"], json!(22.0));
    assert_eq!(daily[0]["humidity"], json!(65.0));
}

#[tokio::test]
async fn favorites_round_trip_over_http() {
    let app = test_app(false).await;

    let response = send(
        &app,
        with_json(
            "POST",
            "/api/favorites",
            json!({"city_id": "2950159", "city_name": "Berlin", "country_name": "Germany"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["is_favorite"], json!(true));

    let response = send(
        &app,
        with_json(
            "PUT",
            "/api/favorites/3067696",
            json!({"name": "Prague", "country": "Czechia"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/api/favorites")).await;
    let body = json_body(response).await;
    let names: Vec<&str> = body
        .as_array()
        .expect("list")
        .iter()
        .filter_map(|f| f["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Prague", "Berlin"]);

    let delete = Request::delete("/api/favorites/2950159")
        .body(Body::empty())
        .expect("request");
    let response = send(&app, delete).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, get("/api/favorites/2950159")).await;
    assert_eq!(json_body(response).await["is_favorite"], json!(false));
}

#[tokio::test]
async fn toggle_with_blank_name_is_rejected() {
    let app = test_app(false).await;
    let response = send(
        &app,
        with_json(
            "POST",
            "/api/favorites",
            json!({"city_id": "2950159", "city_name": "", "country_name": "Germany"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let app = test_app(false).await;
    let huge = "x".repeat(MAX_BODY_BYTES + 1);
    let response = send(
        &app,
        with_json(
            "POST",
            "/api/favorites",
            json!({"city_id": "1", "city_name": huge, "country_name": "Nowhere"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
