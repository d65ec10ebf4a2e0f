//! HTTP handlers for the HotelFinder API
//!
//! Maps the search layer onto the HTTP surface: hotel search, popular
//! destinations, booking, dashboard metrics, and the two health probes,
//! plus a static fallback payload for graceful degradation.

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use hotelfinder_core::metrics::counters;
use hotelfinder_core::types::Hotel;
use hotelfinder_core::{SearchError, SearchRequest, SearchResponse, SearchService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub started_at: Instant,
}

impl AppState {
    /// Creates state around a search service
    pub fn new(search: Arc<SearchService>) -> Self {
        Self {
            search,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the server started
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// The `/api` routes, metered by the coarse quota middleware
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(handle_search))
        .route("/api/search/fallback", get(handle_search_fallback))
        .route("/api/destinations/popular", get(handle_popular_destinations))
        .route("/api/book", post(handle_book))
        .route("/api/metrics", get(handle_metrics))
}

/// Health probes, exempt from the API quota so load balancers always reach them
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handle_health))
        .route("/health/detailed", get(handle_health_detailed))
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

/// Wrapper mapping core search errors onto HTTP responses
pub struct ApiError(pub SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            SearchError::InvalidQuery(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    remaining: None,
                },
            ),
            SearchError::RateLimitExceeded { remaining } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse {
                    error: "Rate limit exceeded".to_string(),
                    remaining: Some(remaining),
                },
            ),
            SearchError::BackendUnavailable(message) => {
                error!("Search backend failure: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal server error".to_string(),
                        remaining: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Query parameters for the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Destination city (required)
    pub city: Option<String>,
    /// Check-in date string
    pub checkin: Option<String>,
    /// Check-out date string
    pub checkout: Option<String>,
    /// Number of guests (default: 2)
    #[serde(default = "default_guests")]
    pub guests: u32,
}

fn default_guests() -> u32 {
    2
}

/// Resolves the caller identity used for per-client rate limiting
///
/// Prefers `x-forwarded-for` when a proxy supplies it, then the peer
/// address.
fn client_id(headers: &HeaderMap, peer: Option<&SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// GET /api/search - cached hotel search
pub async fn handle_search(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = SearchRequest {
        city: params.city.unwrap_or_default(),
        checkin: params.checkin,
        checkout: params.checkout,
        guests: params.guests,
        client_id: client_id(&headers, peer.as_ref().map(|info| &info.0)),
    };

    let response = state.search.search(request).await?;
    Ok(Json(response))
}

/// Static degraded payload returned by the fallback route
#[derive(Debug, Serialize, Deserialize)]
pub struct FallbackResponse {
    pub results: Vec<Hotel>,
    pub metadata: FallbackMetadata,
}

/// Metadata flagging a degraded response
#[derive(Debug, Serialize, Deserialize)]
pub struct FallbackMetadata {
    pub fallback: bool,
    pub message: String,
}

/// GET /api/search/fallback - graceful degradation when main search is down
pub async fn handle_search_fallback(Query(params): Query<SearchParams>) -> Json<FallbackResponse> {
    warn!("Serving fallback search results");

    let results = vec![Hotel {
        id: 999,
        name: "Fallback Hotel".to_string(),
        city: params.city.unwrap_or_else(|| "Unknown".to_string()),
        country: "N/A".to_string(),
        price_per_night: 100.0,
        rating: 3.5,
        amenities: "Basic amenities available".to_string(),
        available_rooms: 10,
    }];

    Json(FallbackResponse {
        results,
        metadata: FallbackMetadata {
            fallback: true,
            message: "Main search service unavailable - showing cached results".to_string(),
        },
    })
}

/// Popular destinations response body
#[derive(Debug, Serialize)]
pub struct PopularDestinationsResponse {
    pub destinations: Vec<hotelfinder_core::ranking::PopularDestination>,
}

/// GET /api/destinations/popular - top destinations from the ranker
pub async fn handle_popular_destinations(
    State(state): State<AppState>,
) -> Json<PopularDestinationsResponse> {
    Json(PopularDestinationsResponse {
        destinations: state.search.popular_destinations(),
    })
}

/// Booking request body
#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub hotel_id: Option<i64>,
    pub checkin: Option<String>,
    pub checkout: Option<String>,
    #[serde(default = "default_guests")]
    pub guests: u32,
    pub total_price: Option<f64>,
}

/// Booking confirmation body
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_id: String,
    pub status: String,
    pub message: String,
}

/// POST /api/book - accepts a booking and confirms it asynchronously
///
/// Persistence lives with the relational collaborator; this handler
/// validates the request, counts the booking, and confirms on a detached
/// task whose failure never reaches the caller.
pub async fn handle_book(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<BookingResponse>, (StatusCode, Json<ErrorResponse>)> {
    let complete = request.hotel_id.is_some()
        && request.checkin.is_some()
        && request.checkout.is_some()
        && request.total_price.is_some();
    if !complete {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing required booking information".to_string(),
                remaining: None,
            }),
        ));
    }

    let booking_id = uuid::Uuid::new_v4().to_string();
    state.search.metrics().increment(counters::BOOKINGS_CREATED);
    info!(
        booking_id = %booking_id,
        hotel_id = request.hotel_id.unwrap_or_default(),
        guests = request.guests,
        "booking accepted"
    );

    // Delayed confirmation, fire-and-forget.
    let search = Arc::clone(&state.search);
    let confirmation_id = booking_id.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        search
            .metrics()
            .increment(counters::BOOKING_CONFIRMATIONS_SENT);
        info!(booking_id = %confirmation_id, "booking confirmation sent");
    });

    Ok(Json(BookingResponse {
        booking_id,
        status: "confirmed".to_string(),
        message: "Booking confirmed! Confirmation email will be sent shortly.".to_string(),
    }))
}

/// GET /api/metrics - dashboard observability report
pub async fn handle_metrics(State(state): State<AppState>) -> Json<hotelfinder_core::search::MetricsReport> {
    Json(state.search.metrics_report())
}

/// Basic health probe body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime: u64,
    pub service: String,
}

/// GET /health - liveness probe
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        uptime: state.uptime_seconds(),
        service: "hotel-search-primary".to_string(),
    })
}

/// Per-service status section of the detailed health probe
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub search_provider: String,
    pub cache: String,
    pub api: String,
}

/// Detailed health probe body
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub services: ServiceStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime: u64,
}

/// GET /health/detailed - readiness probe with per-service status
pub async fn handle_health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let cache_status = if state.search.cache().healthy() {
        "connected"
    } else {
        "disconnected"
    };

    Json(DetailedHealthResponse {
        status: "healthy".to_string(),
        services: ServiceStatus {
            search_provider: "connected".to_string(),
            cache: cache_status.to_string(),
            api: "operational".to_string(),
        },
        timestamp: chrono::Utc::now(),
        uptime: state.uptime_seconds(),
    })
}
