//! Integration tests for the HotelFinder HTTP API
//!
//! Exercises the full request path through the router: cached search,
//! per-client rate limiting, popularity and metrics surfaces, health probes,
//! booking, and degradation when the cache store is down.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use hotelfinder_core::cache::CacheConfig;
use hotelfinder_core::provider::{InMemoryHotelProvider, TracingEventSink};
use hotelfinder_core::rate_limit::RateLimitConfig;
use hotelfinder_core::{SearchConfig, SearchService};
use hotelfinder_serve::middleware::rate_limit::ApiRateLimitConfig;
use hotelfinder_serve::server::build_app;
use hotelfinder_serve::{AppState, ServerConfig};

/// Builds a router and its backing search service with the given core config
fn test_app(search_config: SearchConfig) -> (Router, Arc<SearchService>) {
    let search = Arc::new(SearchService::new(
        Arc::new(InMemoryHotelProvider::with_seed_data()),
        Arc::new(TracingEventSink),
        search_config,
    ));
    let config = ServerConfig {
        api_rate: ApiRateLimitConfig::permissive(),
        ..ServerConfig::default()
    };
    let app = build_app(&config, AppState::new(Arc::clone(&search)));
    (app, search)
}

fn default_app() -> (Router, Arc<SearchService>) {
    test_app(SearchConfig::default())
}

/// Issues a GET request as the given client and parses the JSON body
async fn get_as(router: &Router, uri: &str, client: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("x-forwarded-for", client)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

const AMSTERDAM: &str =
    "/api/search?city=Amsterdam&checkin=2025-01-10&checkout=2025-01-11&guests=2";

#[tokio::test]
async fn test_search_miss_then_hit_same_results() {
    let (app, _) = default_app();

    let (status, first) = get_as(&app, AMSTERDAM, "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["metadata"]["from_cache"], json!(false));
    assert_eq!(first["metadata"]["total_results"], json!(2));
    assert_eq!(first["metadata"]["city"], json!("Amsterdam"));

    let (status, second) = get_as(&app, AMSTERDAM, "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["metadata"]["from_cache"], json!(true));
    assert_eq!(second["results"], first["results"]);

    let first_remaining = first["metadata"]["remaining_requests"].as_u64().unwrap();
    let second_remaining = second["metadata"]["remaining_requests"].as_u64().unwrap();
    assert_eq!(first_remaining, second_remaining + 1);
}

#[tokio::test]
async fn test_search_missing_city_returns_400() {
    let (app, _) = default_app();

    let (status, body) = get_as(&app, "/api/search?guests=2", "203.0.113.1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("City parameter is required"));
}

#[tokio::test]
async fn test_search_rate_limit_per_client() {
    let (app, _) = test_app(SearchConfig {
        rate_limit: RateLimitConfig::new(3, Duration::from_secs(3600)),
        ..SearchConfig::default()
    });

    for _ in 0..3 {
        let (status, _) = get_as(&app, AMSTERDAM, "203.0.113.1").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get_as(&app, AMSTERDAM, "203.0.113.1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], json!("Rate limit exceeded"));
    assert_eq!(body["remaining"], json!(0));

    // Another client still gets through.
    let (status, _) = get_as(&app, AMSTERDAM, "203.0.113.2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_search_unknown_city_returns_empty_results() {
    let (app, _) = default_app();

    let (status, body) = get_as(&app, "/api/search?city=Atlantis", "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["total_results"], json!(0));
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_search_survives_cache_outage() {
    let (app, search) = default_app();
    search.cache().set_connected(false);

    for _ in 0..3 {
        let (status, body) = get_as(&app, AMSTERDAM, "203.0.113.1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["from_cache"], json!(false));
        assert_eq!(body["metadata"]["total_results"], json!(2));
    }
}

#[tokio::test]
async fn test_popular_destinations_ordering() {
    let (app, _) = default_app();

    for _ in 0..3 {
        get_as(&app, "/api/search?city=Paris", "203.0.113.1").await;
    }
    get_as(&app, "/api/search?city=Berlin", "203.0.113.1").await;

    let (status, body) = get_as(&app, "/api/destinations/popular", "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["destinations"],
        json!([
            { "city": "paris", "searches": 3 },
            { "city": "berlin", "searches": 1 }
        ])
    );
}

#[tokio::test]
async fn test_metrics_report_shape() {
    let (app, _) = default_app();

    // One miss, one hit.
    get_as(&app, AMSTERDAM, "203.0.113.1").await;
    get_as(&app, AMSTERDAM, "203.0.113.1").await;

    let (status, body) = get_as(&app, "/api/metrics", "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache_metrics"]["total_hits"], json!(1));
    assert_eq!(body["cache_metrics"]["total_misses"], json!(1));
    assert_eq!(body["cache_metrics"]["hit_rate"], json!(50.0));
    assert_eq!(body["database_stats"]["total_searches"], json!(2));
    assert_eq!(body["database_stats"]["cache_hit_rate"], json!(50.0));
    assert_eq!(body["api_metrics"]["total_requests"], json!(2));
    assert_eq!(body["system_health"]["cache_connected"], json!(true));
    assert_eq!(body["popular_destinations"][0]["city"], json!("amsterdam"));
}

#[tokio::test]
async fn test_health_probes() {
    let (app, search) = default_app();

    let (status, body) = get_as(&app, "/health", "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["service"], json!("hotel-search-primary"));

    let (status, body) = get_as(&app, "/health/detailed", "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services"]["cache"], json!("connected"));

    search.cache().set_connected(false);
    let (_, body) = get_as(&app, "/health/detailed", "203.0.113.1").await;
    assert_eq!(body["services"]["cache"], json!("disconnected"));
}

#[tokio::test]
async fn test_search_fallback_payload() {
    let (app, _) = default_app();

    let (status, body) = get_as(&app, "/api/search/fallback?city=Oslo", "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["fallback"], json!(true));
    assert_eq!(body["results"][0]["name"], json!("Fallback Hotel"));
    assert_eq!(body["results"][0]["city"], json!("Oslo"));
}

#[tokio::test]
async fn test_booking_accepted() {
    let (app, search) = default_app();

    let (status, body) = post_json(
        &app,
        "/api/book",
        json!({
            "hotel_id": 1,
            "checkin": "2025-01-10",
            "checkout": "2025-01-11",
            "guests": 2,
            "total_price": 250.0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("confirmed"));
    assert!(body["booking_id"].as_str().unwrap().len() > 10);
    assert_eq!(search.metrics().get("bookings_created"), 1);
}

#[tokio::test]
async fn test_booking_missing_fields_returns_400() {
    let (app, _) = default_app();

    let (status, body) = post_json(&app, "/api/book", json!({ "hotel_id": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Missing required booking information"));
}

#[tokio::test]
async fn test_coarse_api_quota_returns_429() {
    let search = Arc::new(SearchService::new(
        Arc::new(InMemoryHotelProvider::with_seed_data()),
        Arc::new(TracingEventSink),
        SearchConfig::default(),
    ));
    let config = ServerConfig {
        api_rate: ApiRateLimitConfig::new(NonZeroU32::new(2).unwrap(), 60),
        ..ServerConfig::default()
    };
    let app = build_app(&config, AppState::new(search));

    let metrics = "/api/metrics";
    assert_eq!(get_as(&app, metrics, "203.0.113.1").await.0, StatusCode::OK);
    assert_eq!(get_as(&app, metrics, "203.0.113.1").await.0, StatusCode::OK);
    assert_eq!(
        get_as(&app, metrics, "203.0.113.1").await.0,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Health probes are exempt from the quota.
    assert_eq!(get_as(&app, "/health", "203.0.113.1").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_cache_ttl_expiry_over_http() {
    let (app, _) = test_app(SearchConfig {
        cache: CacheConfig::new(10_000, Duration::from_millis(50)),
        ..SearchConfig::default()
    });

    let (_, first) = get_as(&app, AMSTERDAM, "203.0.113.1").await;
    assert_eq!(first["metadata"]["from_cache"], json!(false));

    tokio::time::sleep(Duration::from_millis(80)).await;

    let (_, second) = get_as(&app, AMSTERDAM, "203.0.113.1").await;
    assert_eq!(second["metadata"]["from_cache"], json!(false));
}
