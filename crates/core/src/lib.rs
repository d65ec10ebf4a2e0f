//! HotelFinder core library
//!
//! The request-shaping layer of the hotel search service: a cache-aside
//! search orchestrator composed from a TTL cache store, a popularity ranker,
//! a per-client fixed-window rate limiter, and monotonic metrics counters.
//! The HTTP surface, the real backing store, and the logging pipeline are
//! external collaborators reached through the traits in [`provider`].

pub mod cache;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod ranking;
pub mod rate_limit;
pub mod search;
pub mod types;

pub use error::{Result, SearchError};
pub use search::{SearchConfig, SearchService};
pub use types::{Hotel, SearchRequest, SearchResponse};
