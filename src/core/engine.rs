use crate::adapters::{OpenCageGeocoder, ReqwestFetcher, SkiddleAdapter, TicketmasterAdapter};
use crate::config::toml_config::AppConfig;
use crate::core::clash::CalendarClashDetector;
use crate::core::genre::{GenreReconciler, GenreVocabulary};
use crate::core::geo::GeoResolver;
use crate::core::search::SearchCoordinator;
use crate::domain::model::{AnnotatedEvent, CalendarEvent, FoundEvent, SearchRequest};
use crate::domain::ports::{CalendarStore, HttpFetcher};
use crate::utils::error::Result;
use std::sync::Arc;

/// 活動搜尋引擎：搜尋所有供應商，並可選擇與行事曆比對
pub struct EventSearchEngine {
    coordinator: SearchCoordinator,
}

impl EventSearchEngine {
    pub fn new(coordinator: SearchCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(config.request_timeout())?);
        Self::from_config_with_fetcher(config, fetcher)
    }

    /// 類型詞彙載入失敗視為致命錯誤
    pub fn from_config_with_fetcher(
        config: &AppConfig,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Result<Self> {
        let vocabulary = GenreVocabulary::from_file(&config.search.genres_file)?;
        tracing::debug!("Loaded genre vocabulary from {}", config.search.genres_file);

        let geocoder = Arc::new(OpenCageGeocoder::new(&config.geocoding, Arc::clone(&fetcher)));
        let mut coordinator =
            SearchCoordinator::new(GenreReconciler::new(vocabulary), GeoResolver::new(geocoder))
                .with_call_timeout(config.request_timeout())
                .with_strict_dates(config.search.strict_date_validation);

        let providers = &config.providers;
        if providers.ticketmaster.enabled {
            let adapter = TicketmasterAdapter::new(&providers.ticketmaster, Arc::clone(&fetcher))
                .with_page_timeout(config.request_timeout());
            coordinator = coordinator.with_provider(Arc::new(adapter));
        }
        if providers.skiddle.enabled {
            coordinator = coordinator.with_provider(Arc::new(SkiddleAdapter::new(
                &providers.skiddle,
                Arc::clone(&fetcher),
            )));
        }
        if !providers.ticketmaster.enabled && !providers.skiddle.enabled {
            tracing::warn!("Every provider is disabled in the configuration");
        }

        Ok(Self::new(coordinator))
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<FoundEvent>> {
        self.coordinator.search(request).await
    }

    pub async fn search_with_clash_detection(
        &self,
        request: &SearchRequest,
        calendar: &[CalendarEvent],
    ) -> Result<Vec<AnnotatedEvent>> {
        let events = self.coordinator.search(request).await?;
        Ok(CalendarClashDetector::new(calendar).classify(events))
    }

    /// Reads the calendar once, concurrently with the provider search.
    pub async fn search_against_store(
        &self,
        request: &SearchRequest,
        store: &dyn CalendarStore,
    ) -> Result<Vec<AnnotatedEvent>> {
        let (events, calendar) =
            tokio::try_join!(self.coordinator.search(request), store.list_events())?;
        Ok(CalendarClashDetector::new(&calendar).classify(events))
    }
}
