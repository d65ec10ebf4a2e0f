//! HotelFinder serve library
//!
//! HTTP interface for the hotel search service. Routes requests into the
//! core search layer and exposes the popularity, metrics, and health
//! surfaces consumed by the dashboard.

pub mod handlers;
pub mod middleware;
pub mod server;

pub use handlers::AppState;
pub use server::HotelFinderServer;

use crate::middleware::rate_limit::ApiRateLimitConfig;

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
    pub max_request_size: usize,
    /// Coarse request quota applied in front of the API routes
    pub api_rate: ApiRateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6969,
            cors_enabled: true,
            max_request_size: 1024 * 1024, // 1MB
            api_rate: ApiRateLimitConfig::default(),
        }
    }
}
