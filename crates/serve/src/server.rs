//! HTTP server assembly for HotelFinder

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use hotelfinder_core::provider::{InMemoryHotelProvider, TracingEventSink};
use hotelfinder_core::{SearchConfig, SearchService};

use crate::handlers::{api_routes, health_routes, AppState};
use crate::middleware::rate_limit::{api_rate_limit_middleware, create_api_limiter};
use crate::ServerConfig;

/// HotelFinder HTTP server
pub struct HotelFinderServer {
    config: ServerConfig,
    app: Router,
}

impl HotelFinderServer {
    /// Creates a server around the demo search service
    pub fn new(config: ServerConfig) -> Self {
        let search = Arc::new(SearchService::new(
            Arc::new(InMemoryHotelProvider::with_seed_data()),
            Arc::new(TracingEventSink),
            SearchConfig::default(),
        ));
        Self::with_search_service(config, search)
    }

    /// Creates a server around an existing search service
    pub fn with_search_service(config: ServerConfig, search: Arc<SearchService>) -> Self {
        let app = build_app(&config, AppState::new(search));
        Self { config, app }
    }

    /// Binds and serves until the process is stopped
    pub async fn start(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("HotelFinder server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }

    /// The server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Assembles the router with middleware layers
pub fn build_app(config: &ServerConfig, state: AppState) -> Router {
    let limiter = create_api_limiter(&config.api_rate);
    let metered_api = api_routes().layer(middleware::from_fn(move |req, next| {
        api_rate_limit_middleware(limiter.clone(), req, next)
    }));
    let mut app = metered_api.merge(health_routes()).with_state(state);

    app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.max_request_size)),
    );

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin("*".parse::<HeaderValue>().expect("valid wildcard origin"))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE]);
        app = app.layer(cors);
    }

    app
}
