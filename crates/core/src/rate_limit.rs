//! Per-client fixed-window rate limiting
//!
//! Counts requests per client identifier within a fixed time window. The
//! first request in a window opens it with a count of 1; subsequent requests
//! increment the count, and admission is denied once the count exceeds the
//! limit. A window is elapsed once its duration has passed since it was
//! opened, and the next request then opens a fresh window.
//!
//! The window map is guarded by a single mutex, so the initialize-or-increment
//! step is atomic per client: two concurrent first-requests cannot both open
//! the window. Elapsed windows are swept from the map during checks, at most
//! one sweep per window duration, so the map stays bounded by the clients
//! active in the current window. When the limiter is disconnected it fails
//! open and admits everything with a full remaining quota.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum admissions per window
    pub limit: u64,
    /// Window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window: Duration::from_secs(3600),
        }
    }
}

impl RateLimitConfig {
    /// Creates a new rate limit configuration
    pub fn new(limit: u64, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Admissions left in the current window
    pub remaining: u64,
}

/// One client's open window
struct RateWindow {
    count: u64,
    window_started_at: Instant,
}

/// Window map plus the time of the last stale-entry sweep
struct LimiterState {
    windows: HashMap<String, RateWindow>,
    last_prune: Instant,
}

/// Fixed-window per-client request limiter
pub struct FixedWindowLimiter {
    state: Mutex<LimiterState>,
    connected: AtomicBool,
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedWindowLimiter {
    /// Creates a limiter with no open windows
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                last_prune: Instant::now(),
            }),
            connected: AtomicBool::new(true),
        }
    }

    /// Charges one request against `client_id`'s window
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hotelfinder_core::rate_limit::FixedWindowLimiter;
    ///
    /// let limiter = FixedWindowLimiter::new();
    /// let decision = limiter.check("10.0.0.1", 100, Duration::from_secs(3600));
    /// assert!(decision.allowed);
    /// assert_eq!(decision.remaining, 99);
    /// ```
    pub fn check(&self, client_id: &str, limit: u64, window: Duration) -> RateLimitDecision {
        if !self.healthy() {
            return RateLimitDecision {
                allowed: true,
                remaining: limit,
            };
        }

        let mut state = match self.state.lock() {
            Ok(state) => state,
            // Fail open on a poisoned map, same as a disconnected store.
            Err(_) => {
                return RateLimitDecision {
                    allowed: true,
                    remaining: limit,
                }
            }
        };

        let now = Instant::now();

        // Elapsed windows are dead weight until their client returns; sweep
        // them at most once per window so the map cannot grow unbounded on
        // one-off client identifiers.
        if now.duration_since(state.last_prune) >= window {
            state
                .windows
                .retain(|_, w| now.duration_since(w.window_started_at) < window);
            state.last_prune = now;
        }

        let entry = state
            .windows
            .entry(client_id.to_string())
            .or_insert_with(|| RateWindow {
                count: 0,
                window_started_at: now,
            });

        if now.duration_since(entry.window_started_at) >= window {
            entry.count = 0;
            entry.window_started_at = now;
        }

        entry.count += 1;
        if entry.count > limit {
            tracing::warn!(client_id = %client_id, "Rate limit exceeded");
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
            };
        }

        RateLimitDecision {
            allowed: true,
            remaining: limit - entry.count,
        }
    }

    /// Drops all open windows
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.windows.clear();
        }
    }

    /// Number of clients with a tracked window, elapsed or not
    pub fn tracked_clients(&self) -> usize {
        self.state.lock().map(|state| state.windows.len()).unwrap_or(0)
    }

    /// Whether the limiter's backing store is reachable
    pub fn healthy(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Marks the limiter reachable or unreachable
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }
}
