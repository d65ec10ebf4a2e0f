//! Coarse API rate limiting middleware
//!
//! A process-wide quota applied in front of the `/api` routes, distinct from
//! the per-client fixed-window limiter inside the search layer. This guard
//! caps total API traffic; the core limiter meters individual callers.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

const DEFAULT_MAX_REQUESTS: NonZeroU32 = NonZeroU32::new(100).unwrap();
const PERMISSIVE_MAX_REQUESTS: NonZeroU32 = NonZeroU32::new(10_000).unwrap();

/// Coarse API quota configuration
#[derive(Debug, Clone)]
pub struct ApiRateLimitConfig {
    /// Maximum number of requests per window
    pub max_requests: NonZeroU32,
    /// Window duration in seconds
    pub window_seconds: u64,
}

impl Default for ApiRateLimitConfig {
    fn default() -> Self {
        // 100 requests per 15 minutes across the API surface.
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_seconds: 900,
        }
    }
}

impl ApiRateLimitConfig {
    /// Creates a new quota configuration
    pub fn new(max_requests: NonZeroU32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }

    /// High limits for local development
    pub fn permissive() -> Self {
        Self {
            max_requests: PERMISSIVE_MAX_REQUESTS,
            window_seconds: 900,
        }
    }
}

/// Shared limiter state for the middleware
pub type SharedApiLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Builds the limiter backing the middleware
pub fn create_api_limiter(config: &ApiRateLimitConfig) -> SharedApiLimiter {
    let quota = Quota::with_period(Duration::from_secs(config.window_seconds))
        .expect("non-zero window")
        .allow_burst(config.max_requests);

    Arc::new(RateLimiter::direct(quota))
}

/// Rejects requests over the coarse API quota with 429
pub async fn api_rate_limit_middleware(
    limiter: SharedApiLimiter,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let retry_after = not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs();

            tracing::warn!(retry_after, "API quota exceeded");

            (
                StatusCode::TOO_MANY_REQUESTS,
                [
                    ("retry-after", retry_after.to_string()),
                    ("x-ratelimit-remaining", "0".to_string()),
                ],
                "Too many requests, please try again later.",
            )
                .into_response()
        }
    }
}
