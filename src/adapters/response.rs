use crate::adapters::http::redact;
use crate::adapters::skiddle::SkiddleResponse;
use crate::adapters::ticketmaster::TicketmasterResponse;
use crate::domain::model::{FoundEvent, ProviderId};
use crate::domain::ports::HttpFetcher;
use crate::utils::error::{EventSearchError, Result};
use chrono::NaiveDate;
use url::Url;

const MAX_ERROR_BODY: usize = 200;

/// 各供應商的回應格式
#[derive(Debug)]
pub enum ProviderResponse {
    Ticketmaster(TicketmasterResponse),
    Skiddle(SkiddleResponse),
}

impl ProviderResponse {
    pub fn decode(provider: ProviderId, body: &str) -> Result<Self> {
        let decoded = match provider {
            ProviderId::Ticketmaster => serde_json::from_str(body).map(Self::Ticketmaster),
            ProviderId::Skiddle => serde_json::from_str(body).map(Self::Skiddle),
        };
        decoded.map_err(|source| EventSearchError::Decode { provider, source })
    }

    pub fn has_next_page(&self) -> bool {
        match self {
            Self::Ticketmaster(response) => response.has_next_page(),
            Self::Skiddle(_) => false,
        }
    }

    pub fn normalize(self) -> Vec<FoundEvent> {
        match self {
            Self::Ticketmaster(response) => response.normalize(),
            Self::Skiddle(response) => response.normalize(),
        }
    }
}

/// GET + 狀態檢查 + 解碼
pub async fn fetch_response(
    fetcher: &dyn HttpFetcher,
    provider: ProviderId,
    url: &Url,
) -> Result<ProviderResponse> {
    let response = fetcher.get(url).await?;
    if !response.is_success() {
        let body: String = response.body.chars().take(MAX_ERROR_BODY).collect();
        tracing::debug!("{} failed for {}", provider, redact(url));
        return Err(EventSearchError::ProviderStatus {
            provider,
            status: response.status,
            body,
        });
    }
    ProviderResponse::decode(provider, &response.body)
}

/// Accepts a bare date or anything starting with one (e.g. "2025-06-01T19:30:00").
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let candidate = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()
}
