use super::*;
use chrono::TimeZone;

fn report() -> CurrentReport {
    CurrentReport {
        place_name: "Lisbon".to_string(),
        condition: WeatherCondition {
            main: "Clear".to_string(),
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
        },
        temp: 24.3,
        feels_like: 23.9,
        temp_min: 21.0,
        temp_max: 26.5,
        pressure: 1016,
        humidity: 48,
        wind_speed: 4.1,
        wind_deg: 320,
        visibility: Some(10_000),
        cloudiness: 0,
        sunrise: None,
        sunset: None,
        observed_at: Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap(),
    }
}

#[test]
fn offset_is_zero_based_from_page() {
    let mut query = CityQuery {
        page: 1,
        limit: 20,
        sort_key: SortKey::Name,
        direction: SortDirection::Asc,
        continent: ContinentFilter::All,
    };
    assert_eq!(query.offset(), 0);
    query.page = 4;
    assert_eq!(query.offset(), 60);
    query.page = 0;
    assert_eq!(query.offset(), 0);
}

#[test]
fn only_payload_errors_are_not_unavailability() {
    assert!(UpstreamError::Unavailable("down".into()).is_unavailable());
    assert!(UpstreamError::Status(503).is_unavailable());
    assert!(!UpstreamError::Decode("bad json".into()).is_unavailable());
    assert!(!UpstreamError::MalformedSample("dt_txt".into()).is_unavailable());
}

#[test]
fn summary_copies_condition_and_temperatures() {
    let summary = report().summary();
    assert_eq!(summary.main, "Clear");
    assert_eq!(summary.icon, "01d");
    assert_eq!(summary.temp, 24.3);
    assert_eq!(summary.temp_min, 21.0);
    assert_eq!(summary.temp_max, 26.5);
}

#[test]
fn current_weather_carries_the_city_id() {
    let current = report().into_current_weather(CityId::new("2267057"));
    assert_eq!(current.city_id.as_str(), "2267057");
    assert_eq!(current.place_name, "Lisbon");
    assert_eq!(current.wind_deg, 320);
    assert_eq!(current.visibility, Some(10_000));
}
