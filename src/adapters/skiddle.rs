use crate::adapters::response::{fetch_response, parse_event_date};
use crate::config::toml_config::SkiddleConfig;
use crate::domain::model::{CityCoordinate, FoundEvent, LocationMode, ProviderId, SearchRequest};
use crate::domain::ports::{HttpFetcher, ProviderAdapter, ProviderQuery};
use crate::utils::error::{EventSearchError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Default, Deserialize)]
pub struct SkiddleResponse {
    #[serde(default)]
    results: Vec<SkiddleEvent>,
}

#[derive(Debug, Deserialize)]
struct SkiddleEvent {
    #[serde(rename = "EventCode", default)]
    event_code: String,
    #[serde(rename = "eventname")]
    event_name: String,
    #[serde(default)]
    venue: Option<SkiddleVenue>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    genres: Vec<SkiddleGenre>,
}

#[derive(Debug, Deserialize)]
struct SkiddleVenue {
    #[serde(default)]
    town: String,
}

#[derive(Debug, Deserialize)]
struct SkiddleGenre {
    name: String,
}

impl SkiddleResponse {
    pub(crate) fn normalize(self) -> Vec<FoundEvent> {
        self.results
            .into_iter()
            .filter_map(|event| {
                let Some(date) = parse_event_date(&event.date) else {
                    tracing::debug!("Dropping skiddle event '{}' without a date", event.event_name);
                    return None;
                };
                Some(FoundEvent {
                    name: event.event_name,
                    date,
                    city: event.venue.map(|v| v.town).unwrap_or_default(),
                    ticket_url: event.link,
                    // EventCode 是 Skiddle 的大類 (CLUB, LIVE, ...)
                    genre: event.event_code,
                    subgenre: event
                        .genres
                        .into_iter()
                        .next()
                        .map(|g| g.name)
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// 以座標查詢，每個城市一次請求
pub struct SkiddleAdapter {
    config: SkiddleConfig,
    fetcher: Arc<dyn HttpFetcher>,
}

impl SkiddleAdapter {
    pub fn new(config: &SkiddleConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            config: config.clone(),
            fetcher,
        }
    }
}

#[async_trait]
impl ProviderAdapter for SkiddleAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Skiddle
    }

    fn location_mode(&self) -> LocationMode {
        LocationMode::Coordinates
    }

    fn build_query(
        &self,
        request: &SearchRequest,
        genres: Option<&str>,
        coordinate: Option<(&str, CityCoordinate)>,
    ) -> Result<ProviderQuery> {
        let (city, coordinate) = coordinate.ok_or_else(|| EventSearchError::ConfigError {
            message: "skiddle queries require a resolved city coordinate".to_string(),
        })?;
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            EventSearchError::ConfigError {
                message: format!("invalid skiddle endpoint: {}", e),
            }
        })?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", &self.config.api_key);
            query.append_pair("longitude", &format!("{:.6}", coordinate.longitude));
            query.append_pair("latitude", &format!("{:.6}", coordinate.latitude));
            query.append_pair("radius", &self.config.radius_miles.to_string());
            query.append_pair("minDate", &request.date_from.format("%Y-%m-%d").to_string());
            query.append_pair("maxDate", &request.date_to.format("%Y-%m-%d").to_string());
            if self.config.include_description {
                query.append_pair("description", "1");
            }
            if let Some(genres) = genres {
                query.append_pair("g", genres);
            }
        }

        Ok(ProviderQuery {
            provider: ProviderId::Skiddle,
            target: city.to_string(),
            url,
        })
    }

    async fn execute(&self, query: ProviderQuery) -> Result<Vec<FoundEvent>> {
        let response = fetch_response(self.fetcher.as_ref(), self.id(), &query.url).await?;
        Ok(response.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::ReqwestFetcher;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use std::time::Duration;

    const MANCHESTER: CityCoordinate = CityCoordinate {
        longitude: -2.2426,
        latitude: 53.4808,
    };

    fn adapter(server: &MockServer) -> SkiddleAdapter {
        let config = SkiddleConfig {
            endpoint: server.url("/api/v1/events/search/"),
            api_key: "sk-key".to_string(),
            ..SkiddleConfig::default()
        };
        let fetcher = Arc::new(ReqwestFetcher::new(Duration::from_secs(5)).unwrap());
        SkiddleAdapter::new(&config, fetcher)
    }

    fn request() -> SearchRequest {
        SearchRequest::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        )
        .with_cities(["Manchester"])
    }

    #[test]
    fn test_build_query_requires_coordinate() {
        let server = MockServer::start();
        let err = adapter(&server).build_query(&request(), None, None).unwrap_err();
        assert!(matches!(err, EventSearchError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn test_execute_sends_bare_dates_and_genre_ids() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/events/search/")
                .query_param("api_key", "sk-key")
                .query_param("longitude", "-2.242600")
                .query_param("latitude", "53.480800")
                .query_param("radius", "8")
                .query_param("minDate", "2025-06-01")
                .query_param("maxDate", "2025-06-30")
                .query_param("g", "15,2");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "error": 0,
                    "totalcount": "1",
                    "results": [{
                        "EventCode": "CLUB",
                        "eventname": "Warehouse Techno",
                        "venue": { "name": "Depot", "town": "Manchester" },
                        "link": "https://www.skiddle.com/e/1",
                        "date": "2025-06-14",
                        "genres": [ { "genreid": "15", "name": "Techno" } ]
                    }]
                }));
        });

        let adapter = adapter(&server);
        let query = adapter
            .build_query(&request(), Some("15,2"), Some(("Manchester", MANCHESTER)))
            .unwrap();
        assert_eq!(query.target, "Manchester");

        let events = adapter.execute(query).await.unwrap();

        api_mock.assert();
        assert_eq!(
            events,
            vec![FoundEvent {
                name: "Warehouse Techno".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
                city: "Manchester".to_string(),
                ticket_url: "https://www.skiddle.com/e/1".to_string(),
                genre: "CLUB".to_string(),
                subgenre: "Techno".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/events/search/");
            then.status(200).body("<html>rate limited</html>");
        });

        let adapter = adapter(&server);
        let query = adapter
            .build_query(&request(), None, Some(("Manchester", MANCHESTER)))
            .unwrap();
        let err = adapter.execute(query).await.unwrap_err();

        assert!(matches!(err, EventSearchError::Decode { .. }));
    }
}
