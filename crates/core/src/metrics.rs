//! Named monotonic counters for search observability
//!
//! Counters are created implicitly on first increment and only ever grow
//! within the process lifetime. Snapshots are point-in-time with no
//! transactional guarantee across counters, which is acceptable for the
//! dashboard use they serve.

use std::collections::HashMap;
use std::sync::RwLock;

/// Well-known counter names used by the search layer
pub mod counters {
    /// Every search request entering the orchestrator
    pub const TOTAL_REQUESTS: &str = "total_requests";
    /// Searches answered from the cache
    pub const CACHE_HITS: &str = "cache_hits";
    /// Searches that fell through to the backing provider
    pub const CACHE_MISSES: &str = "cache_misses";
    /// Bookings accepted by the booking endpoint
    pub const BOOKINGS_CREATED: &str = "bookings_created";
    /// Confirmation emails sent by the detached booking task
    pub const BOOKING_CONFIRMATIONS_SENT: &str = "booking_confirmations_sent";
    /// Sum of per-search response times, for the average in the dashboard report
    pub const RESPONSE_TIME_MS_TOTAL: &str = "response_time_ms_total";
}

/// Registry of named monotonic counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    values: RwLock<HashMap<String, u64>>,
}

impl MetricsRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds 1 to `name`, creating the counter at 0 first if needed
    ///
    /// Returns the counter's new value.
    pub fn increment(&self, name: &str) -> u64 {
        match self.values.write() {
            Ok(mut values) => {
                let value = values.entry(name.to_string()).or_insert(0);
                *value += 1;
                *value
            }
            Err(_) => 0,
        }
    }

    /// Adds `delta` to `name`, creating the counter at 0 first if needed
    ///
    /// Returns the counter's new value.
    pub fn add(&self, name: &str, delta: u64) -> u64 {
        match self.values.write() {
            Ok(mut values) => {
                let value = values.entry(name.to_string()).or_insert(0);
                *value += delta;
                *value
            }
            Err(_) => 0,
        }
    }

    /// Current value of `name`, 0 when never incremented
    pub fn get(&self, name: &str) -> u64 {
        self.values
            .read()
            .map(|values| values.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.values
            .read()
            .map(|values| values.clone())
            .unwrap_or_default()
    }
}

/// Cache hit rate as a percentage with two-decimal precision
///
/// Returns `0.0` when no cache operation has been counted yet.
///
/// # Examples
///
/// ```
/// use hotelfinder_core::metrics::hit_rate;
///
/// assert_eq!(hit_rate(7, 3), 70.00);
/// assert_eq!(hit_rate(0, 0), 0.0);
/// ```
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 0.0;
    }
    let rate = (hits as f64 / total as f64) * 100.0;
    (rate * 100.0).round() / 100.0
}
