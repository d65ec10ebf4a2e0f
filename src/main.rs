//! HotelFinder - cached hotel search demo service
//!
//! Serves a hotel search API shaped by a cache-aside result cache, a
//! popularity ranking of destinations, and per-client rate limiting, with a
//! metrics surface for the dashboard.

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hotelfinder_core::provider::{InMemoryHotelProvider, TracingEventSink};
use hotelfinder_core::{SearchConfig, SearchService};
use hotelfinder_serve::middleware::rate_limit::ApiRateLimitConfig;
use hotelfinder_serve::{HotelFinderServer, ServerConfig};

#[derive(Parser)]
#[command(name = "hotelfinder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HotelFinder - cached hotel search service")]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 6969)]
    port: u16,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Relax the coarse API quota (local development)
    #[arg(long)]
    permissive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        cors_enabled: !cli.no_cors,
        api_rate: if cli.permissive {
            ApiRateLimitConfig::permissive()
        } else {
            ApiRateLimitConfig::default()
        },
        ..ServerConfig::default()
    };

    info!(
        "Starting HotelFinder v{} on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.host,
        config.port
    );

    // Process-wide search layer: cache, ranker, limiter, and counters are
    // constructed once here and shared by handle across requests.
    let search = Arc::new(SearchService::new(
        Arc::new(InMemoryHotelProvider::with_seed_data()),
        Arc::new(TracingEventSink),
        SearchConfig::default(),
    ));

    HotelFinderServer::with_search_service(config, search)
        .start()
        .await
}
