//! Diversity and rotation
//!
//! Tracks how often each candidate (phrasing variant, structure, tone) has
//! been chosen per category and how well it performed, and balances future
//! selections across runs.

pub mod engine;
pub mod store;
pub mod strategy;

pub use engine::{CategoryStats, RotationEngine, Selection};
pub use store::{HistoryStore, JsonFileStore, MemoryStore};
pub use strategy::RotationStrategy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Usage and performance counters for one `(category, item)` pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub usage_count: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub successes: u64,
    pub total: u64,
}

impl UsageRecord {
    /// `None` until at least one outcome has been recorded
    pub fn success_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.successes as f64 / self.total as f64)
    }

    pub fn mark_used(&mut self, at: DateTime<Utc>) {
        self.usage_count += 1;
        self.last_used = Some(at);
    }

    pub fn record_outcome(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.successes += 1;
        }
    }
}

/// Persisted rotation state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationHistory {
    /// Keyed by `"{category}:{item}"`
    #[serde(default)]
    pub records: BTreeMap<String, UsageRecord>,
    /// Pattern or structural fragment frequencies
    #[serde(default)]
    pub fragments: BTreeMap<String, u64>,
    /// Next index per category for sequential rotation
    #[serde(default)]
    pub sequence: BTreeMap<String, usize>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RotationHistory {
    pub fn record(&self, category: &str, item: &str) -> Option<&UsageRecord> {
        self.records.get(&history_key(category, item))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.fragments.is_empty() && self.sequence.is_empty()
    }
}

pub fn history_key(category: &str, item: &str) -> String {
    format!("{category}:{item}")
}

/// Normalised Shannon entropy of fragment frequencies in `0.0..=1.0`.
///
/// Zero when fewer than two distinct fragments have been seen.
pub fn diversity_score(fragments: &BTreeMap<String, u64>) -> f64 {
    let counts: Vec<f64> = fragments
        .values()
        .filter(|count| **count > 0)
        .map(|count| *count as f64)
        .collect();
    if counts.len() < 2 {
        return 0.0;
    }
    let total: f64 = counts.iter().sum();
    let entropy: f64 = counts
        .iter()
        .map(|count| {
            let p = count / total;
            -p * p.ln()
        })
        .sum();
    (entropy / (counts.len() as f64).ln()).clamp(0.0, 1.0)
}
