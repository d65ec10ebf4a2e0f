//! Collaborator boundaries of the search layer
//!
//! The orchestrator talks to two external collaborators through the traits
//! defined here: a backing search provider that answers city lookups, and a
//! sink receiving structured search events. The in-memory implementations
//! back the demo server and the test suite.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Hotel, SearchEvent};

/// Errors surfaced by a backing search provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider failed or timed out; an empty result set is NOT an error
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Backing store answering hotel searches by city
///
/// Implementations may be slow or fail; the orchestrator treats a timeout
/// identically to a failure and does not retry.
#[async_trait]
pub trait HotelProvider: Send + Sync {
    /// Finds hotels matching `city`, in the provider's own ordering
    async fn find_by_city(&self, city: &str) -> Result<Vec<Hotel>, ProviderError>;
}

/// Sink receiving search events emitted fire-and-forget by the orchestrator
///
/// Implementations must swallow their own failures; a broken sink never
/// affects the primary response path.
#[async_trait]
pub trait SearchEventSink: Send + Sync {
    /// Records one completed search
    async fn record(&self, event: SearchEvent);
}

/// In-memory hotel provider backed by a fixed inventory
///
/// Matches substrings of the city case-insensitively and orders results by
/// rating descending, mirroring the relational store it stands in for.
pub struct InMemoryHotelProvider {
    hotels: Vec<Hotel>,
}

impl InMemoryHotelProvider {
    /// Creates a provider over the given inventory
    pub fn new(hotels: Vec<Hotel>) -> Self {
        Self { hotels }
    }

    /// Creates a provider seeded with the demo inventory
    pub fn with_seed_data() -> Self {
        Self::new(seed_hotels())
    }
}

#[async_trait]
impl HotelProvider for InMemoryHotelProvider {
    async fn find_by_city(&self, city: &str) -> Result<Vec<Hotel>, ProviderError> {
        let needle = city.trim().to_lowercase();
        let mut matches: Vec<Hotel> = self
            .hotels
            .iter()
            .filter(|hotel| hotel.city.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(matches)
    }
}

/// Event sink that logs search events through tracing
#[derive(Debug, Default)]
pub struct TracingEventSink;

#[async_trait]
impl SearchEventSink for TracingEventSink {
    async fn record(&self, event: SearchEvent) {
        tracing::info!(
            city = %event.city,
            guests = event.guests,
            result_count = event.result_count,
            elapsed_ms = event.elapsed_ms,
            cache_hit = event.cache_hit,
            "search completed"
        );
    }
}

/// The demo hotel inventory
pub fn seed_hotels() -> Vec<Hotel> {
    let rows: [(i64, &str, &str, &str, f64, f64, &str, u32); 10] = [
        (1, "Grand Hotel Amsterdam", "Amsterdam", "Netherlands", 250.0, 4.5, "WiFi,Pool,Spa,Restaurant", 15),
        (2, "Hotel Berlin Central", "Berlin", "Germany", 180.0, 4.2, "WiFi,Gym,Bar,Restaurant", 20),
        (3, "Paris Luxury Suite", "Paris", "France", 320.0, 4.8, "WiFi,Spa,Restaurant,RoomService", 8),
        (4, "London Bridge Hotel", "London", "UK", 280.0, 4.4, "WiFi,Gym,Bar,Concierge", 12),
        (5, "Barcelona Beach Resort", "Barcelona", "Spain", 220.0, 4.6, "WiFi,Pool,Beach,Restaurant", 25),
        (6, "Rome Historic Inn", "Rome", "Italy", 190.0, 4.3, "WiFi,Restaurant,Tours", 18),
        (7, "Amsterdam Canal View", "Amsterdam", "Netherlands", 200.0, 4.1, "WiFi,CanalView,Bikes", 10),
        (8, "Berlin Modern Loft", "Berlin", "Germany", 160.0, 4.0, "WiFi,Kitchen,ModernDesign", 16),
        (9, "Paris Boutique Hotel", "Paris", "France", 290.0, 4.7, "WiFi,Boutique,Restaurant,Spa", 6),
        (10, "London City Center", "London", "UK", 240.0, 4.2, "WiFi,Central,Shopping,Theater", 14),
    ];

    rows.into_iter()
        .map(
            |(id, name, city, country, price_per_night, rating, amenities, available_rooms)| Hotel {
                id,
                name: name.to_string(),
                city: city.to_string(),
                country: country.to_string(),
                price_per_night,
                rating,
                amenities: amenities.to_string(),
                available_rooms,
            },
        )
        .collect()
}
