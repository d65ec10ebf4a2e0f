//! Domain types for the hotel search layer
//!
//! Defines the hotel record shape, the inbound search request, the derived
//! cache key, and the response/metadata/event structures handed back to the
//! HTTP layer and the logging collaborator.

use serde::{Deserialize, Serialize};

/// A hotel record as returned by the backing search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    /// Unique hotel identifier
    pub id: i64,
    /// Hotel display name
    pub name: String,
    /// City the hotel is located in
    pub city: String,
    /// Country the hotel is located in
    pub country: String,
    /// Nightly rate
    pub price_per_night: f64,
    /// Average guest rating (0.0 - 5.0)
    pub rating: f64,
    /// Comma-separated amenity list
    pub amenities: String,
    /// Rooms currently available for booking
    pub available_rooms: u32,
}

/// An inbound search request as handed over by the HTTP layer
///
/// Date fields are free-form strings validated upstream; they participate in
/// the cache key but are not interpreted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Destination city (required, free text)
    pub city: String,
    /// Check-in date string
    pub checkin: Option<String>,
    /// Check-out date string
    pub checkout: Option<String>,
    /// Number of guests
    pub guests: u32,
    /// Caller's network identity, used for rate limiting
    pub client_id: String,
}

impl SearchRequest {
    /// Create a request with the default guest count of 2
    pub fn new<S: Into<String>>(city: S, client_id: S) -> Self {
        Self {
            city: city.into(),
            checkin: None,
            checkout: None,
            guests: 2,
            client_id: client_id.into(),
        }
    }

    /// The lowercased, trimmed city term used for popularity tracking
    pub fn normalized_city(&self) -> String {
        self.city.trim().to_lowercase()
    }
}

/// Cache key derived deterministically from normalized query fields
///
/// Identical logical queries (case-insensitive city) always produce the same
/// key. Fields are joined with a fixed `-` separator; absent dates contribute
/// an empty segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey(String);

impl SearchKey {
    /// Derive the key for a search request
    pub fn for_request(request: &SearchRequest) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            request.normalized_city(),
            request.checkin.as_deref().unwrap_or(""),
            request.checkout.as_deref().unwrap_or(""),
            request.guests
        ))
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observability metadata returned alongside search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
    /// City as submitted by the caller
    pub city: String,
    /// Check-in date as submitted
    pub checkin: Option<String>,
    /// Check-out date as submitted
    pub checkout: Option<String>,
    /// Guest count
    pub guests: u32,
    /// Number of results returned
    pub total_results: usize,
    /// Wall-clock time spent serving the request
    pub response_time_ms: u64,
    /// Whether the results came from the cache
    pub from_cache: bool,
    /// Requests left in the caller's rate-limit window
    pub remaining_requests: u64,
}

/// A completed search: results in provider order plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching hotels, in the backing provider's own ordering
    pub results: Vec<Hotel>,
    /// Observability metadata for this request
    pub metadata: SearchMetadata,
}

/// Structured search event handed to the logging collaborator
///
/// Built by the orchestrator and emitted fire-and-forget; the core does not
/// own its lifecycle beyond construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEvent {
    pub city: String,
    pub checkin: Option<String>,
    pub checkout: Option<String>,
    pub guests: u32,
    pub result_count: usize,
    pub elapsed_ms: u64,
    pub cache_hit: bool,
}
