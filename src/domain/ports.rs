use crate::domain::model::{
    CalendarEvent, CityCoordinate, FoundEvent, LocationMode, ProviderId, SearchRequest,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// 找不到城市時回傳 `EventSearchError::CityNotFound`
    async fn resolve(&self, city: &str) -> Result<CityCoordinate>;
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn list_events(&self) -> Result<Vec<CalendarEvent>>;
}

/// 單次供應商呼叫的描述
#[derive(Debug, Clone)]
pub struct ProviderQuery {
    pub provider: ProviderId,
    /// 查詢對象，用於日誌 (城市名稱或城市清單)
    pub target: String,
    pub url: Url,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    fn location_mode(&self) -> LocationMode;

    /// `genres` 為已對應到此供應商詞彙的逗號分隔值
    fn build_query(
        &self,
        request: &SearchRequest,
        genres: Option<&str>,
        coordinate: Option<(&str, CityCoordinate)>,
    ) -> Result<ProviderQuery>;

    async fn execute(&self, query: ProviderQuery) -> Result<Vec<FoundEvent>>;

    /// 單次 `execute` 最多發出的依序請求數 (分頁供應商大於 1)
    fn request_budget(&self) -> u32 {
        1
    }
}
