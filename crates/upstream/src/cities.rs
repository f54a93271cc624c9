use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use shared::{
    domain::{CityId, CityRecord, ContinentFilter, Coordinates, SortKey},
    protocol::CityPage,
};
use tracing::{debug, warn};
use url::Url;

use crate::{decode_json, CityQuery, CitySource, UpstreamError};

pub const DEFAULT_CITIES_URL: &str = "https://public.opendatasoft.com/api/explore/v2.1/catalog/datasets/geonames-all-cities-with-a-population-1000/records";

/// Client of the OpenDataSoft records endpoint of the geonames dataset.
#[derive(Clone)]
pub struct OpenDataSoftCities {
    http: reqwest::Client,
    records_url: Url,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    results: Vec<RawCity>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    #[serde(deserialize_with = "string_or_number")]
    geoname_id: String,
    name: String,
    #[serde(default)]
    cou_name_en: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    population: Option<i64>,
    #[serde(default)]
    coordinates: Option<RawCoordinates>,
}

#[derive(Debug, Deserialize)]
struct RawCoordinates {
    lat: f64,
    lon: f64,
}

// the dataset has shipped geoname_id both as a JSON string and as a number
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) => format!("{value:.0}"),
    })
}

impl RawCity {
    fn into_record(self) -> Option<CityRecord> {
        let Some(coordinates) = self.coordinates else {
            warn!(geoname_id = %self.geoname_id, "cities: record without coordinates skipped");
            return None;
        };
        Some(CityRecord {
            id: CityId(self.geoname_id),
            name: self.name,
            country: self.cou_name_en.unwrap_or_default(),
            timezone: self.timezone.unwrap_or_default(),
            population: self.population.unwrap_or(0),
            coordinates: Coordinates {
                lat: coordinates.lat,
                lon: coordinates.lon,
            },
            weather: None,
        })
    }
}

fn order_field(key: SortKey) -> &'static str {
    match key {
        SortKey::Country => "cou_name_en",
        other => other.as_str(),
    }
}

impl OpenDataSoftCities {
    pub fn new(records_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let records_url = Url::parse(records_url)
            .map_err(|e| UpstreamError::Unavailable(format!("invalid cities url: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, records_url })
    }

    async fn fetch(&self, params: &[(&str, String)]) -> Result<RecordsResponse, UpstreamError> {
        debug!(url = %self.records_url, ?params, "cities: fetching records");
        let response = self
            .http
            .get(self.records_url.clone())
            .query(params)
            .send()
            .await?;
        decode_json(response).await
    }

    fn records(results: Vec<RawCity>) -> Vec<CityRecord> {
        results.into_iter().filter_map(RawCity::into_record).collect()
    }
}

#[async_trait]
impl CitySource for OpenDataSoftCities {
    async fn query(&self, query: &CityQuery) -> Result<CityPage, UpstreamError> {
        let offset = query.offset();
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", offset.to_string()),
            (
                "order_by",
                format!(
                    "{} {}",
                    order_field(query.sort_key),
                    query.direction.as_str()
                ),
            ),
        ];
        if let ContinentFilter::Only(continent) = query.continent {
            params.push(("where", format!("continent:\"{}\"", continent.name())));
        }

        let response = self.fetch(&params).await?;
        let has_next = response.total_count > offset + u64::from(query.limit);
        Ok(CityPage {
            cities: Self::records(response.results),
            has_next,
        })
    }

    async fn search(&self, text: &str, limit: u32) -> Result<Vec<CityRecord>, UpstreamError> {
        let needle = text.trim().replace(['"', '*'], "");
        let params = [
            ("where", format!("name:*{needle}*")),
            ("limit", limit.to_string()),
            ("order_by", "population DESC".to_string()),
        ];
        let response = self.fetch(&params).await?;
        Ok(Self::records(response.results))
    }

    async fn find(&self, id: &CityId) -> Result<Option<CityRecord>, UpstreamError> {
        if !id.is_geoname() {
            debug!(%id, "cities: id is not a geoname id");
            return Ok(None);
        }
        let params = [
            ("where", format!("geoname_id:{id}")),
            ("limit", "1".to_string()),
        ];
        let response = self.fetch(&params).await?;
        Ok(Self::records(response.results).into_iter().next())
    }
}

#[cfg(test)]
#[path = "tests/cities_tests.rs"]
mod tests;
