use crate::adapters::response::{fetch_response, parse_event_date, ProviderResponse};
use crate::config::toml_config::TicketmasterConfig;
use crate::domain::model::{CityCoordinate, FoundEvent, LocationMode, ProviderId, SearchRequest};
use crate::domain::ports::{HttpFetcher, ProviderAdapter, ProviderQuery};
use crate::utils::error::{EventSearchError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default, Deserialize)]
pub struct TicketmasterResponse {
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedEvents,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedEvents {
    #[serde(default)]
    events: Vec<TicketmasterEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    number: u32,
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct TicketmasterEvent {
    name: String,
    #[serde(default)]
    url: String,
    dates: EventDates,
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedVenues,
    #[serde(default)]
    classifications: Vec<Classification>,
}

#[derive(Debug, Deserialize)]
struct EventDates {
    start: EventStart,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventStart {
    #[serde(default)]
    local_date: String,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedVenues {
    #[serde(default)]
    venues: Vec<Venue>,
}

#[derive(Debug, Deserialize)]
struct Venue {
    #[serde(default)]
    city: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    #[serde(default)]
    segment: Option<Named>,
    #[serde(default)]
    genre: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

impl TicketmasterResponse {
    pub(crate) fn has_next_page(&self) -> bool {
        self.page
            .as_ref()
            .is_some_and(|page| page.number + 1 < page.total_pages)
    }

    pub(crate) fn normalize(self) -> Vec<FoundEvent> {
        self.embedded
            .events
            .into_iter()
            .filter_map(|event| {
                let Some(date) = parse_event_date(&event.dates.start.local_date) else {
                    tracing::debug!("Dropping ticketmaster event '{}' without a date", event.name);
                    return None;
                };
                let city = event
                    .embedded
                    .venues
                    .into_iter()
                    .next()
                    .and_then(|venue| venue.city)
                    .map(|city| city.name)
                    .unwrap_or_default();
                let classification = event.classifications.into_iter().next();
                let (genre, subgenre) = match classification {
                    Some(c) => (
                        c.segment.map(|s| s.name).unwrap_or_default(),
                        c.genre.map(|g| g.name).unwrap_or_default(),
                    ),
                    None => (String::new(), String::new()),
                };

                Some(FoundEvent {
                    name: event.name,
                    date,
                    city,
                    ticket_url: event.url,
                    genre,
                    subgenre,
                })
            })
            .collect()
    }
}

/// Discovery API：一次請求帶入所有城市名稱
pub struct TicketmasterAdapter {
    config: TicketmasterConfig,
    fetcher: Arc<dyn HttpFetcher>,
    page_timeout: Duration,
}

impl TicketmasterAdapter {
    pub fn new(config: &TicketmasterConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            config: config.clone(),
            fetcher,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
        }
    }

    /// Bounds each page request on its own.
    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    async fn fetch_page(&self, target: &str, page: u32, url: &Url) -> Result<ProviderResponse> {
        let request = fetch_response(self.fetcher.as_ref(), self.id(), url);
        match tokio::time::timeout(self.page_timeout, request).await {
            Ok(response) => response,
            Err(_) => Err(EventSearchError::ProviderTimeout {
                provider: self.id(),
                target: format!("{} (page {})", target, page),
                seconds: self.page_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl ProviderAdapter for TicketmasterAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Ticketmaster
    }

    fn location_mode(&self) -> LocationMode {
        LocationMode::CityNames
    }

    fn build_query(
        &self,
        request: &SearchRequest,
        genres: Option<&str>,
        _coordinate: Option<(&str, CityCoordinate)>,
    ) -> Result<ProviderQuery> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            EventSearchError::ConfigError {
                message: format!("invalid ticketmaster endpoint: {}", e),
            }
        })?;

        let cities = request.cities.join(",");
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("apikey", &self.config.api_key);
            if !cities.is_empty() {
                query.append_pair("city", &cities);
            }
            if let Some(genres) = genres {
                query.append_pair("classificationName", genres);
            }
            // ISO-8601 instants, end of day keeps the last date inclusive
            query.append_pair(
                "startDateTime",
                &format!("{}T00:00:00Z", request.date_from.format("%Y-%m-%d")),
            );
            query.append_pair(
                "endDateTime",
                &format!("{}T23:59:59Z", request.date_to.format("%Y-%m-%d")),
            );
            query.append_pair("size", &self.config.page_size.to_string());
        }

        Ok(ProviderQuery {
            provider: ProviderId::Ticketmaster,
            target: if cities.is_empty() {
                "all cities".to_string()
            } else {
                cities
            },
            url,
        })
    }

    async fn execute(&self, query: ProviderQuery) -> Result<Vec<FoundEvent>> {
        let mut events = Vec::new();

        for page in 0..self.config.max_pages.max(1) {
            let mut url = query.url.clone();
            url.query_pairs_mut().append_pair("page", &page.to_string());

            let response = match self.fetch_page(&query.target, page, &url).await {
                Ok(response) => response,
                // 第一頁失敗才算整體失敗，之後的頁面失敗保留已取得的結果
                Err(e) if page > 0 => {
                    tracing::warn!(
                        "ticketmaster page {} for {} failed, keeping {} events: {}",
                        page,
                        query.target,
                        events.len(),
                        e
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            let has_next = response.has_next_page();
            events.extend(response.normalize());
            if !has_next {
                break;
            }
        }

        Ok(events)
    }

    fn request_budget(&self) -> u32 {
        self.config.max_pages.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::ReqwestFetcher;
    use chrono::NaiveDate;
    use crate::domain::ports::HttpResponse;
    use httpmock::prelude::*;

    fn sample_page(names: &[(&str, &str)], number: u32, total_pages: u32) -> serde_json::Value {
        let events: Vec<serde_json::Value> = names
            .iter()
            .map(|(name, date)| {
                serde_json::json!({
                    "name": name,
                    "url": format!("https://tickets.example/{}", name),
                    "dates": { "start": { "localDate": date, "localTime": "19:30:00" } },
                    "_embedded": { "venues": [ { "name": "Albert Hall", "city": { "name": "Manchester" } } ] },
                    "classifications": [ { "segment": { "name": "Music" }, "genre": { "name": "Rock" } } ]
                })
            })
            .collect();
        serde_json::json!({
            "_embedded": { "events": events },
            "page": { "size": 2, "totalElements": 4, "totalPages": total_pages, "number": number }
        })
    }

    fn adapter(server: &MockServer, max_pages: u32) -> TicketmasterAdapter {
        let config = TicketmasterConfig {
            endpoint: server.url("/discovery/v2/events.json"),
            api_key: "tm-key".to_string(),
            page_size: 2,
            max_pages,
            ..TicketmasterConfig::default()
        };
        let fetcher = Arc::new(ReqwestFetcher::new(Duration::from_secs(5)).unwrap());
        TicketmasterAdapter::new(&config, fetcher)
    }

    fn request() -> SearchRequest {
        SearchRequest::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        )
        .with_cities(["Manchester", "Leeds"])
    }

    #[test]
    fn test_normalize_fills_missing_nested_fields() {
        let body = r#"{"_embedded":{"events":[
            {"name":"Bare","dates":{"start":{"localDate":"2025-06-03"}}},
            {"name":"Undated","dates":{"start":{}}}
        ]}}"#;
        let response: TicketmasterResponse = serde_json::from_str(body).unwrap();
        let events = response.normalize();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Bare");
        assert_eq!(events[0].city, "");
        assert_eq!(events[0].genre, "");
    }

    #[test]
    fn test_empty_result_has_no_embedded_block() {
        let response: TicketmasterResponse =
            serde_json::from_str(r#"{"page":{"size":20,"totalElements":0,"totalPages":0,"number":0}}"#)
                .unwrap();
        assert!(!response.has_next_page());
        assert!(response.normalize().is_empty());
    }

    #[test]
    fn test_build_query_uses_instants_and_city_list() {
        let server = MockServer::start();
        let adapter = adapter(&server, 1);
        let query = adapter
            .build_query(&request(), Some("Rock,Jazz"), None)
            .unwrap();

        let pairs: Vec<(String, String)> = query.url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("apikey"), Some("tm-key"));
        assert_eq!(get("city"), Some("Manchester,Leeds"));
        assert_eq!(get("classificationName"), Some("Rock,Jazz"));
        assert_eq!(get("startDateTime"), Some("2025-06-01T00:00:00Z"));
        assert_eq!(get("endDateTime"), Some("2025-06-30T23:59:59Z"));
        assert_eq!(get("size"), Some("2"));
        assert_eq!(query.target, "Manchester,Leeds");
    }

    #[tokio::test]
    async fn test_execute_normalizes_events() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/discovery/v2/events.json")
                .query_param("city", "Manchester,Leeds");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(sample_page(&[("Gig A", "2025-06-02"), ("Gig B", "2025-06-01")], 0, 1));
        });

        let adapter = adapter(&server, 1);
        let query = adapter.build_query(&request(), None, None).unwrap();
        let events = adapter.execute(query).await.unwrap();

        api_mock.assert();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "Gig A");
        assert_eq!(events[0].city, "Manchester");
        assert_eq!(events[0].genre, "Music");
        assert_eq!(events[0].subgenre, "Rock");
        assert_eq!(events[0].ticket_url, "https://tickets.example/Gig A");
    }

    #[tokio::test]
    async fn test_execute_follows_pages_up_to_limit() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/discovery/v2/events.json")
                .query_param("page", "0");
            then.status(200)
                .json_body(sample_page(&[("Gig A", "2025-06-02")], 0, 3));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/discovery/v2/events.json")
                .query_param("page", "1");
            then.status(200)
                .json_body(sample_page(&[("Gig B", "2025-06-05")], 1, 3));
        });

        let adapter = adapter(&server, 2);
        let query = adapter.build_query(&request(), None, None).unwrap();
        let events = adapter.execute(query).await.unwrap();

        first.assert();
        second.assert();
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Gig A", "Gig B"]);
    }

    #[tokio::test]
    async fn test_execute_fails_on_error_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/discovery/v2/events.json");
            then.status(401).body(r#"{"fault":"Invalid ApiKey"}"#);
        });

        let adapter = adapter(&server, 1);
        let query = adapter.build_query(&request(), None, None).unwrap();
        let err = adapter.execute(query).await.unwrap_err();

        api_mock.assert();
        assert!(matches!(
            err,
            EventSearchError::ProviderStatus { status: 401, .. }
        ));
    }

    /// Serves page 0 at once and never answers later pages in time.
    struct StalledAfterFirstPage;

    #[async_trait]
    impl HttpFetcher for StalledAfterFirstPage {
        async fn get(&self, url: &Url) -> Result<HttpResponse> {
            let first_page = url.query_pairs().any(|(k, v)| k == "page" && v == "0");
            if !first_page {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(HttpResponse {
                status: 200,
                body: sample_page(&[("Gig A", "2025-06-02")], 0, 3).to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_stalled_later_page_keeps_earlier_pages() {
        let config = TicketmasterConfig {
            max_pages: 2,
            ..TicketmasterConfig::default()
        };
        let adapter = TicketmasterAdapter::new(&config, Arc::new(StalledAfterFirstPage))
            .with_page_timeout(Duration::from_millis(100));
        assert_eq!(adapter.request_budget(), 2);

        let query = adapter.build_query(&request(), None, None).unwrap();
        let events = adapter.execute(query).await.unwrap();

        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Gig A"]);
    }

    #[tokio::test]
    async fn test_failed_later_page_keeps_earlier_pages() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/discovery/v2/events.json")
                .query_param("page", "0");
            then.status(200)
                .json_body(sample_page(&[("Gig A", "2025-06-02")], 0, 3));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/discovery/v2/events.json")
                .query_param("page", "1");
            then.status(503).body("unavailable");
        });

        let adapter = adapter(&server, 3);
        let query = adapter.build_query(&request(), None, None).unwrap();
        let events = adapter.execute(query).await.unwrap();

        second.assert();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Gig A");
    }
}
