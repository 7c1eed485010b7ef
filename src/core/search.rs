use crate::core::genre::{GenreReconciler, ReconciledGenres};
use crate::core::geo::{GeoResolver, ResolvedCity};
use crate::domain::model::{FoundEvent, LocationMode, ProviderId, SearchRequest};
use crate::domain::ports::{ProviderAdapter, ProviderQuery};
use crate::utils::error::{EventSearchError, Result};
use crate::utils::validation::validate_date_range;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

type Invocation = (Arc<dyn ProviderAdapter>, ProviderQuery);

/// 協調類型對應、地理編碼與各供應商的並行查詢
pub struct SearchCoordinator {
    reconciler: Arc<GenreReconciler>,
    geo: GeoResolver,
    providers: Vec<Arc<dyn ProviderAdapter>>,
    call_timeout: Duration,
    strict_dates: bool,
}

impl SearchCoordinator {
    pub fn new(reconciler: GenreReconciler, geo: GeoResolver) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            geo,
            providers: Vec::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            strict_dates: false,
        }
    }

    pub fn with_provider(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.providers.push(adapter);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_strict_dates(mut self, strict: bool) -> Self {
        self.strict_dates = strict;
        self
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<FoundEvent>> {
        self.search_as_of(request, chrono::Local::now().date_naive())
            .await
    }

    /// Same as [`search`](Self::search) with an explicit "today" for date validation.
    pub async fn search_as_of(
        &self,
        request: &SearchRequest,
        today: NaiveDate,
    ) -> Result<Vec<FoundEvent>> {
        self.check_dates(request, today)?;

        let active: Vec<Arc<dyn ProviderAdapter>> = self
            .providers
            .iter()
            .filter(|adapter| request.is_enabled(adapter.id()))
            .cloned()
            .collect();
        if active.is_empty() {
            tracing::info!("No providers enabled, nothing to search");
            return Ok(Vec::new());
        }

        let provider_ids: Vec<ProviderId> = active.iter().map(|adapter| adapter.id()).collect();
        let needs_coordinates = active
            .iter()
            .any(|adapter| adapter.location_mode() == LocationMode::Coordinates);

        // 類型對應與地理編碼互不相依
        let (genres, cities) = tokio::join!(
            async { self.reconciler.reconcile_all(&request.genres, provider_ids.iter().copied()) },
            async {
                if needs_coordinates {
                    self.geo.resolve_all(&request.cities).await
                } else {
                    Vec::new()
                }
            }
        );

        let invocations = plan_invocations(request, &active, &genres, &cities);
        tracing::debug!(
            "🚀 Launching {} provider calls ({} providers, {} resolved cities)",
            invocations.len(),
            active.len(),
            cities.len()
        );

        let events = self.fan_out(invocations).await;
        tracing::info!("🔍 Search found {} events", events.len());
        Ok(events)
    }

    fn check_dates(&self, request: &SearchRequest, today: NaiveDate) -> Result<()> {
        match validate_date_range(request.date_from, request.date_to, today) {
            Ok(()) => Ok(()),
            Err(e) if self.strict_dates => {
                tracing::error!("❌ {}", e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!("{} (searching anyway)", e);
                Ok(())
            }
        }
    }

    /// Scatter/gather: one task per invocation, each sends exactly one batch.
    async fn fan_out(&self, invocations: Vec<Invocation>) -> Vec<FoundEvent> {
        let task_count = invocations.len();
        if task_count == 0 {
            return Vec::new();
        }

        // 通道容量等於任務數，送出不會阻塞
        let (tx, mut rx) = mpsc::channel::<(usize, Vec<FoundEvent>)>(task_count);
        let mut handles = Vec::with_capacity(task_count);

        for (index, (adapter, query)) in invocations.into_iter().enumerate() {
            let tx = tx.clone();
            // 分頁供應商依請求數放寬整體上限
            let call_timeout = self.call_timeout.saturating_mul(adapter.request_budget());
            handles.push(tokio::spawn(async move {
                let batch = run_invocation(adapter, query, call_timeout).await;
                if tx.send((index, batch)).await.is_err() {
                    tracing::debug!("Result channel closed before batch {} was sent", index);
                }
            }));
        }
        drop(tx);

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Provider task aborted: {}", e);
            }
        }

        let mut batches = Vec::with_capacity(task_count);
        while let Some(batch) = rx.recv().await {
            batches.push(batch);
        }
        merge_batches(batches)
    }
}

fn plan_invocations(
    request: &SearchRequest,
    active: &[Arc<dyn ProviderAdapter>],
    genres: &ReconciledGenres,
    cities: &[ResolvedCity],
) -> Vec<Invocation> {
    let mut invocations = Vec::new();

    for adapter in active {
        let provider_genres = genres.get(adapter.id());
        let queries = match adapter.location_mode() {
            LocationMode::CityNames => vec![adapter.build_query(request, provider_genres, None)],
            LocationMode::Coordinates => cities
                .iter()
                .map(|city| {
                    adapter.build_query(
                        request,
                        provider_genres,
                        Some((city.name.as_str(), city.coordinate)),
                    )
                })
                .collect(),
        };

        for query in queries {
            match query {
                Ok(query) => invocations.push((Arc::clone(adapter), query)),
                Err(e) => tracing::warn!("Could not build {} query: {}", adapter.id(), e),
            }
        }
    }
    invocations
}

async fn run_invocation(
    adapter: Arc<dyn ProviderAdapter>,
    query: ProviderQuery,
    call_timeout: Duration,
) -> Vec<FoundEvent> {
    let provider = query.provider;
    let target = query.target.clone();

    match tokio::time::timeout(call_timeout, adapter.execute(query)).await {
        Ok(Ok(events)) => {
            tracing::debug!("{} returned {} events for {}", provider, events.len(), target);
            events
        }
        Ok(Err(e)) => {
            tracing::warn!("⚠️ {} search for {} failed: {}", provider, target, e);
            Vec::new()
        }
        Err(_) => {
            let e = EventSearchError::ProviderTimeout {
                provider,
                target,
                seconds: call_timeout.as_secs(),
            };
            tracing::warn!("⚠️ {}", e);
            Vec::new()
        }
    }
}

/// Flattens batches in launch order, then stable-sorts by date.
pub fn merge_batches(mut batches: Vec<(usize, Vec<FoundEvent>)>) -> Vec<FoundEvent> {
    batches.sort_by_key(|(index, _)| *index);
    let mut events: Vec<FoundEvent> = batches.into_iter().flat_map(|(_, batch)| batch).collect();
    events.sort_by_key(|event| event.date);
    events
}
