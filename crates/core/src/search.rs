//! Search orchestrator
//!
//! Composes the cache store, popularity ranker, rate limiter, and metrics
//! counters with the backing provider to answer searches cache-aside:
//! admit the caller through the limiter, look the key up in the cache, fall
//! back to the provider on a miss and store the result with a TTL, count the
//! hit or miss, track the destination's popularity, and emit a search event
//! fire-and-forget. Failures of the infrastructure pieces degrade the path
//! (always-miss cache, fail-open limiter, empty ranking) but never fail the
//! request; only invalid input, an exhausted quota, or a provider failure
//! surface to the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheConfig, SearchCache};
use crate::error::{Result, SearchError};
use crate::metrics::{counters, hit_rate, MetricsRegistry};
use crate::provider::{HotelProvider, SearchEventSink};
use crate::ranking::{PopularDestination, PopularityRanker};
use crate::rate_limit::{FixedWindowLimiter, RateLimitConfig};
use crate::types::{SearchEvent, SearchKey, SearchMetadata, SearchRequest, SearchResponse};

/// Search layer configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Cache store settings; `default_ttl` is applied to stored results
    pub cache: CacheConfig,
    /// Per-client fixed-window quota
    pub rate_limit: RateLimitConfig,
    /// How many destinations the popularity surface returns
    pub popular_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            popular_limit: 5,
        }
    }
}

/// Cache effectiveness section of the metrics report
#[derive(Debug, Clone, Serialize)]
pub struct CacheMetrics {
    /// `100 * hits / (hits + misses)`, 0 when nothing was counted yet
    pub hit_rate: f64,
    pub total_hits: u64,
    pub total_misses: u64,
}

/// Search-log section of the metrics report, derived from the counters
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub total_searches: u64,
    /// Mean wall-clock time per search, 0 when nothing was served yet
    pub avg_response_time_ms: f64,
    pub cache_hit_rate: f64,
}

/// Store connectivity section of the metrics report
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    /// Whether the cache store is reachable
    pub cache_connected: bool,
}

/// Point-in-time observability report consumed by the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub database_stats: DatabaseStats,
    pub cache_metrics: CacheMetrics,
    /// Raw counter values by name
    pub api_metrics: HashMap<String, u64>,
    pub popular_destinations: Vec<PopularDestination>,
    pub system_health: SystemHealth,
}

/// The request-shaping layer in front of the backing search provider
///
/// Owns the process-wide cache, ranker, limiter, and counters; constructed
/// once at startup and shared by handle across concurrent requests. The
/// backing provider and event sink are injected.
pub struct SearchService {
    cache: Arc<SearchCache>,
    ranker: Arc<PopularityRanker>,
    limiter: Arc<FixedWindowLimiter>,
    metrics: Arc<MetricsRegistry>,
    provider: Arc<dyn HotelProvider>,
    events: Arc<dyn SearchEventSink>,
    config: SearchConfig,
}

impl SearchService {
    /// Creates a search service around the given collaborators
    pub fn new(
        provider: Arc<dyn HotelProvider>,
        events: Arc<dyn SearchEventSink>,
        config: SearchConfig,
    ) -> Self {
        Self {
            cache: Arc::new(SearchCache::new(config.cache.clone())),
            ranker: Arc::new(PopularityRanker::new()),
            limiter: Arc::new(FixedWindowLimiter::new()),
            metrics: Arc::new(MetricsRegistry::new()),
            provider,
            events,
            config,
        }
    }

    /// Answers one search request cache-aside
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidQuery` when the city is empty,
    /// `SearchError::RateLimitExceeded` when the caller's window is
    /// exhausted, and `SearchError::BackendUnavailable` when the backing
    /// provider fails on a cache miss. Cache, ranker, and limiter outages
    /// never surface here.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();

        if request.city.trim().is_empty() {
            return Err(SearchError::invalid_query("City parameter is required"));
        }

        self.metrics.increment(counters::TOTAL_REQUESTS);

        let decision = self.limiter.check(
            &request.client_id,
            self.config.rate_limit.limit,
            self.config.rate_limit.window,
        );
        if !decision.allowed {
            return Err(SearchError::RateLimitExceeded { remaining: 0 });
        }

        let key = SearchKey::for_request(&request);
        debug!(key = %key, client_id = %request.client_id, "searching");

        let (results, from_cache) = match self.cache.get(&key).await {
            Some(cached) => {
                self.metrics.increment(counters::CACHE_HITS);
                (cached.hotels, true)
            }
            None => {
                let hotels = self
                    .provider
                    .find_by_city(&request.city)
                    .await
                    .map_err(|e| SearchError::backend(e.to_string()))?;
                // Only successful lookups are cached; failures are never stored.
                self.cache
                    .set(key, hotels.clone(), self.config.cache.default_ttl)
                    .await;
                self.metrics.increment(counters::CACHE_MISSES);
                (hotels, false)
            }
        };

        // Every search counts toward popularity, cache hit or not.
        self.ranker.track(&request.normalized_city());

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics
            .add(counters::RESPONSE_TIME_MS_TOTAL, elapsed_ms);
        self.emit_event(&request, results.len(), elapsed_ms, from_cache);

        info!(
            city = %request.city,
            results = results.len(),
            from_cache,
            elapsed_ms,
            "search served"
        );

        Ok(SearchResponse {
            metadata: SearchMetadata {
                city: request.city,
                checkin: request.checkin,
                checkout: request.checkout,
                guests: request.guests,
                total_results: results.len(),
                response_time_ms: elapsed_ms,
                from_cache,
                remaining_requests: decision.remaining,
            },
            results,
        })
    }

    /// The most searched destinations, highest score first
    pub fn popular_destinations(&self) -> Vec<PopularDestination> {
        self.ranker.top(self.config.popular_limit)
    }

    /// Builds the observability report for the dashboard surface
    pub fn metrics_report(&self) -> MetricsReport {
        let api_metrics = self.metrics.snapshot();
        let hits = api_metrics.get(counters::CACHE_HITS).copied().unwrap_or(0);
        let misses = api_metrics
            .get(counters::CACHE_MISSES)
            .copied()
            .unwrap_or(0);
        // Served searches are exactly the ones counted as a hit or a miss.
        let total_searches = hits + misses;
        let elapsed_total = api_metrics
            .get(counters::RESPONSE_TIME_MS_TOTAL)
            .copied()
            .unwrap_or(0);
        let avg_response_time_ms = if total_searches == 0 {
            0.0
        } else {
            elapsed_total as f64 / total_searches as f64
        };

        MetricsReport {
            database_stats: DatabaseStats {
                total_searches,
                avg_response_time_ms,
                cache_hit_rate: hit_rate(hits, misses),
            },
            cache_metrics: CacheMetrics {
                hit_rate: hit_rate(hits, misses),
                total_hits: hits,
                total_misses: misses,
            },
            api_metrics,
            popular_destinations: self.popular_destinations(),
            system_health: SystemHealth {
                cache_connected: self.cache.healthy(),
            },
        }
    }

    /// Hands the event to the sink on a detached task; sink failures are
    /// swallowed and never affect the response path.
    fn emit_event(&self, request: &SearchRequest, result_count: usize, elapsed_ms: u64, cache_hit: bool) {
        let event = SearchEvent {
            city: request.city.clone(),
            checkin: request.checkin.clone(),
            checkout: request.checkout.clone(),
            guests: request.guests,
            result_count,
            elapsed_ms,
            cache_hit,
        };
        let sink = Arc::clone(&self.events);
        tokio::spawn(async move {
            sink.record(event).await;
        });
    }

    /// The cache store handle
    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// The popularity ranker handle
    pub fn ranker(&self) -> &PopularityRanker {
        &self.ranker
    }

    /// The rate limiter handle
    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    /// The metrics registry handle
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// The search layer configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InMemoryHotelProvider, ProviderError, TracingEventSink};
    use crate::types::Hotel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider wrapper counting how often the backing store is consulted
    struct CountingProvider {
        inner: InMemoryHotelProvider,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryHotelProvider::with_seed_data(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HotelProvider for CountingProvider {
        async fn find_by_city(&self, city: &str) -> std::result::Result<Vec<Hotel>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_city(city).await
        }
    }

    /// Provider that always fails, simulating a backend outage
    struct FailingProvider;

    #[async_trait]
    impl HotelProvider for FailingProvider {
        async fn find_by_city(&self, _city: &str) -> std::result::Result<Vec<Hotel>, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }
    }

    fn service_with(provider: Arc<dyn HotelProvider>, config: SearchConfig) -> SearchService {
        SearchService::new(provider, Arc::new(TracingEventSink), config)
    }

    fn amsterdam_request() -> SearchRequest {
        SearchRequest {
            city: "Amsterdam".to_string(),
            checkin: Some("2025-01-10".to_string()),
            checkout: Some("2025-01-11".to_string()),
            guests: 2,
            client_id: "10.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_city_rejected() {
        let service = service_with(CountingProvider::new(), SearchConfig::default());
        let mut request = amsterdam_request();
        request.city = "  ".to_string();

        let err = service.search(request).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_miss_then_hit_with_identical_results() {
        let provider = CountingProvider::new();
        let service = service_with(provider.clone(), SearchConfig::default());

        let first = service.search(amsterdam_request()).await.unwrap();
        assert!(!first.metadata.from_cache);
        assert_eq!(first.metadata.total_results, 2);

        let second = service.search(amsterdam_request()).await.unwrap();
        assert!(second.metadata.from_cache);
        assert_eq!(second.results, first.results);

        // The backing store was consulted exactly once.
        assert_eq!(provider.calls(), 1);
        assert_eq!(service.metrics().get(counters::CACHE_HITS), 1);
        assert_eq!(service.metrics().get(counters::CACHE_MISSES), 1);
    }

    #[tokio::test]
    async fn test_remaining_requests_decrease_by_one() {
        let service = service_with(CountingProvider::new(), SearchConfig::default());

        let first = service.search(amsterdam_request()).await.unwrap();
        let second = service.search(amsterdam_request()).await.unwrap();
        assert_eq!(
            first.metadata.remaining_requests,
            second.metadata.remaining_requests + 1
        );
    }

    #[tokio::test]
    async fn test_elapsed_ttl_behaves_as_fresh_miss() {
        let provider = CountingProvider::new();
        let config = SearchConfig {
            cache: CacheConfig::new(10_000, Duration::from_millis(50)),
            ..SearchConfig::default()
        };
        let service = service_with(provider.clone(), config);

        let first = service.search(amsterdam_request()).await.unwrap();
        assert!(!first.metadata.from_cache);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let second = service.search(amsterdam_request()).await.unwrap();
        assert!(!second.metadata.from_cache);
        assert_eq!(provider.calls(), 2);
        assert_eq!(service.metrics().get(counters::CACHE_MISSES), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let config = SearchConfig {
            rate_limit: RateLimitConfig::new(3, Duration::from_secs(3600)),
            ..SearchConfig::default()
        };
        let service = service_with(CountingProvider::new(), config);

        for _ in 0..3 {
            service.search(amsterdam_request()).await.unwrap();
        }
        let err = service.search(amsterdam_request()).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::RateLimitExceeded { remaining: 0 }
        ));

        // A different client is unaffected.
        let mut other = amsterdam_request();
        other.client_id = "10.0.0.2".to_string();
        assert!(service.search(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_and_is_not_cached() {
        let service = service_with(Arc::new(FailingProvider), SearchConfig::default());

        let err = service.search(amsterdam_request()).await.unwrap_err();
        assert!(matches!(err, SearchError::BackendUnavailable(_)));
        assert_eq!(service.cache().entry_count(), 0);
        assert_eq!(service.metrics().get(counters::CACHE_MISSES), 0);
    }

    #[tokio::test]
    async fn test_unhealthy_cache_degrades_to_always_miss() {
        let provider = CountingProvider::new();
        let service = service_with(provider.clone(), SearchConfig::default());
        service.cache().set_connected(false);

        for _ in 0..3 {
            let response = service.search(amsterdam_request()).await.unwrap();
            assert!(!response.metadata.from_cache);
            assert_eq!(response.metadata.total_results, 2);
        }
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_every_search_counts_toward_popularity() {
        let service = service_with(CountingProvider::new(), SearchConfig::default());

        // One miss and two hits; all three count.
        for _ in 0..3 {
            service.search(amsterdam_request()).await.unwrap();
        }
        let mut berlin = amsterdam_request();
        berlin.city = "Berlin".to_string();
        service.search(berlin).await.unwrap();

        let top = service.popular_destinations();
        assert_eq!(top[0].city, "amsterdam");
        assert_eq!(top[0].searches, 3);
        assert_eq!(top[1].city, "berlin");
        assert_eq!(top[1].searches, 1);
    }

    #[tokio::test]
    async fn test_empty_result_set_is_not_an_error() {
        let service = service_with(CountingProvider::new(), SearchConfig::default());
        let mut request = amsterdam_request();
        request.city = "Atlantis".to_string();

        let response = service.search(request).await.unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.metadata.total_results, 0);
    }

    #[tokio::test]
    async fn test_results_keep_provider_ordering() {
        let service = service_with(CountingProvider::new(), SearchConfig::default());
        let mut request = amsterdam_request();
        request.city = "Paris".to_string();

        let response = service.search(request).await.unwrap();
        let names: Vec<&str> = response.results.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Paris Luxury Suite", "Paris Boutique Hotel"]);
    }

    #[tokio::test]
    async fn test_metrics_report() {
        let service = service_with(CountingProvider::new(), SearchConfig::default());

        // 1 miss followed by 2 hits.
        for _ in 0..3 {
            service.search(amsterdam_request()).await.unwrap();
        }

        let report = service.metrics_report();
        assert_eq!(report.database_stats.total_searches, 3);
        assert_eq!(report.database_stats.cache_hit_rate, 66.67);
        assert_eq!(report.cache_metrics.total_hits, 2);
        assert_eq!(report.cache_metrics.total_misses, 1);
        assert_eq!(report.cache_metrics.hit_rate, 66.67);
        assert_eq!(report.api_metrics.get(counters::TOTAL_REQUESTS), Some(&3));
        assert_eq!(report.popular_destinations[0].city, "amsterdam");
        assert!(report.system_health.cache_connected);
    }

    #[tokio::test]
    async fn test_metrics_report_empty_service() {
        let service = service_with(CountingProvider::new(), SearchConfig::default());
        let report = service.metrics_report();
        assert_eq!(report.cache_metrics.hit_rate, 0.0);
        assert_eq!(report.database_stats.total_searches, 0);
        assert_eq!(report.database_stats.avg_response_time_ms, 0.0);
        assert!(report.popular_destinations.is_empty());
    }
}
