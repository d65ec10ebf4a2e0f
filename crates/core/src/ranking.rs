//! Popularity ranking of search terms
//!
//! Tracks how often each destination is searched for and answers top-N
//! queries sorted by score. Counts are approximate under concurrency in the
//! sense that readers may observe a snapshot between writer updates; each
//! tracked occurrence adds exactly 1.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// A destination together with its accumulated search count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularDestination {
    /// Normalized (lowercased) destination term
    pub city: String,
    /// Number of searches recorded for the term
    pub searches: u64,
}

/// Sorted popularity ranking of search terms
///
/// Terms are expected to arrive already normalized; the ranker stores them
/// verbatim. While unavailable, `track` drops the increment and `top` returns
/// an empty sequence instead of failing.
pub struct PopularityRanker {
    scores: RwLock<HashMap<String, u64>>,
    available: AtomicBool,
}

impl Default for PopularityRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl PopularityRanker {
    /// Creates an empty ranker
    pub fn new() -> Self {
        Self {
            scores: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Records one occurrence of `term`
    ///
    /// Returns `false` when the ranker is unavailable and the occurrence was
    /// dropped.
    pub fn track(&self, term: &str) -> bool {
        if !self.available() {
            return false;
        }
        match self.scores.write() {
            Ok(mut scores) => {
                *scores.entry(term.to_string()).or_insert(0) += 1;
                true
            }
            Err(_) => false,
        }
    }

    /// Returns up to `n` terms ordered by score descending
    ///
    /// Ties are broken by lexical order of the term, so the ordering is
    /// deterministic. Returns an empty sequence when unavailable.
    pub fn top(&self, n: usize) -> Vec<PopularDestination> {
        if !self.available() {
            return Vec::new();
        }
        let scores = match self.scores.read() {
            Ok(scores) => scores,
            Err(_) => return Vec::new(),
        };

        let mut ranked: Vec<PopularDestination> = scores
            .iter()
            .map(|(city, searches)| PopularDestination {
                city: city.clone(),
                searches: *searches,
            })
            .collect();
        ranked.sort_by(|a, b| b.searches.cmp(&a.searches).then_with(|| a.city.cmp(&b.city)));
        ranked.truncate(n);
        ranked
    }

    /// The current score for a term, 0 when never tracked
    pub fn score(&self, term: &str) -> u64 {
        self.scores
            .read()
            .map(|scores| scores.get(term).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Whether the ranker is accepting updates
    pub fn available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Marks the ranker available or unavailable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }
}
