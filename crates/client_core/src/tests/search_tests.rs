use super::*;
use async_trait::async_trait;
use shared::{
    domain::{CityId, Coordinates},
    protocol::CityPage,
};
use tokio::sync::Mutex;

use crate::ListQuery;

#[derive(Default)]
struct RecordingSource {
    searches: Mutex<Vec<(String, u32)>>,
}

#[async_trait]
impl CityQuerySource for RecordingSource {
    async fn query_cities(&self, _query: &ListQuery, _limit: u32) -> Result<CityPage, ClientError> {
        Err(ClientError::Unexpected("not used".into()))
    }

    async fn search_cities(&self, text: &str, limit: u32) -> Result<Vec<CityRecord>, ClientError> {
        self.searches.lock().await.push((text.to_string(), limit));
        Ok(vec![CityRecord {
            id: CityId::new("2643743"),
            name: format!("{text} match"),
            country: "United Kingdom".to_string(),
            timezone: "Europe/London".to_string(),
            population: 8_961_989,
            coordinates: Coordinates {
                lat: 51.5,
                lon: -0.13,
            },
            weather: None,
        }])
    }
}

#[tokio::test]
async fn short_input_skips_the_network() {
    let source = Arc::new(RecordingSource::default());
    let search = CitySearch::new(source.clone());

    assert!(search.search("lo").await.expect("short").is_empty());
    assert!(search.search("  l  ").await.expect("padded").is_empty());
    assert!(source.searches.lock().await.is_empty());
}

#[tokio::test]
async fn trimmed_input_is_sent_with_the_limit() {
    let source = Arc::new(RecordingSource::default());
    let search = CitySearch::new(source.clone()).with_limit(5);

    let found = search.search("  lon ").await.expect("search");
    assert_eq!(found[0].name, "lon match");
    assert_eq!(
        source.searches.lock().await.as_slice(),
        &[("lon".to_string(), 5)]
    );
}

#[tokio::test]
async fn only_the_last_keystroke_is_searched() {
    let source = Arc::new(RecordingSource::default());
    let search = CitySearch::new(source.clone()).with_debounce(Duration::from_millis(20));

    let (first, second) = tokio::join!(search.search_as_typed("lond"), search.search_as_typed("londo"));
    assert!(first.expect("first").is_none());
    assert_eq!(second.expect("second").expect("latest").len(), 1);
    assert_eq!(
        source.searches.lock().await.as_slice(),
        &[("londo".to_string(), DEFAULT_SEARCH_LIMIT)]
    );
}
