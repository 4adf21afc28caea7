//! Selection strategies
//!
//! Each strategy is a pure function of the candidates' usage records (given
//! in candidate order) plus a random source, returning the chosen index.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::trace;

use super::UsageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Advance a stored index modulo the candidate count
    Sequential,
    /// Sample with weight `1 / (usage_count + 1)`
    WeightedRandom,
    /// Minimum usage count, ties broken uniformly
    LeastUsed,
    /// Success rate plus an exploration bonus, sampled among the top few
    PerformanceBased,
    /// Anything unused within the window, else least recently used
    TimeWindowed,
    /// Chosen from the amount of history available
    #[default]
    Auto,
}

impl RotationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStrategy::Sequential => "sequential",
            RotationStrategy::WeightedRandom => "weighted_random",
            RotationStrategy::LeastUsed => "least_used",
            RotationStrategy::PerformanceBased => "performance_based",
            RotationStrategy::TimeWindowed => "time_windowed",
            RotationStrategy::Auto => "auto",
        }
    }
}

impl fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that are not per-candidate
#[derive(Debug, Clone, Copy)]
pub struct StrategyParams {
    pub window: Duration,
    pub exploration_bonus: f64,
    pub top_k: usize,
    pub auto_min_uses: u64,
    pub now: DateTime<Utc>,
}

/// Resolve `Auto` into a concrete strategy.
///
/// Any never-used candidate means least-used; every candidate at or above
/// `min_uses` means performance-based; weighted random otherwise.
pub fn resolve_auto(records: &[UsageRecord], min_uses: u64) -> RotationStrategy {
    if records.iter().any(|r| r.usage_count == 0) {
        RotationStrategy::LeastUsed
    } else if records.iter().all(|r| r.usage_count >= min_uses) {
        RotationStrategy::PerformanceBased
    } else {
        RotationStrategy::WeightedRandom
    }
}

/// Index to use, and the stored index to keep for next time
pub fn sequential(len: usize, stored: usize) -> (usize, usize) {
    if len == 0 {
        return (0, 0);
    }
    let index = stored % len;
    (index, (index + 1) % len)
}

pub fn weighted_random<R: Rng>(records: &[UsageRecord], rng: &mut R) -> usize {
    let weights: Vec<f64> = records
        .iter()
        .map(|r| 1.0 / (r.usage_count as f64 + 1.0))
        .collect();
    sample_weighted(&weights, rng)
}

pub fn least_used<R: Rng>(records: &[UsageRecord], rng: &mut R) -> usize {
    let Some(min) = records.iter().map(|r| r.usage_count).min() else {
        return 0;
    };
    let tied: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.usage_count == min)
        .map(|(i, _)| i)
        .collect();
    tied[rng.random_range(0..tied.len())]
}

/// Untested candidates score 1.0; others `success_rate + bonus / (total + 1)`.
pub fn performance_score(record: &UsageRecord, exploration_bonus: f64) -> f64 {
    match record.success_rate() {
        None => 1.0,
        Some(rate) => rate + exploration_bonus / (record.total as f64 + 1.0),
    }
}

pub fn performance_based<R: Rng>(
    records: &[UsageRecord],
    exploration_bonus: f64,
    top_k: usize,
    rng: &mut R,
) -> usize {
    if records.is_empty() {
        return 0;
    }
    let mut ranked: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, performance_score(r, exploration_bonus)))
        .collect();
    // Stable sort keeps candidate order among equal scores
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top = top_k.clamp(1, ranked.len());
    ranked[rng.random_range(0..top)].0
}

pub fn time_windowed<R: Rng>(
    records: &[UsageRecord],
    now: DateTime<Utc>,
    window: Duration,
    rng: &mut R,
) -> usize {
    if records.is_empty() {
        return 0;
    }
    let window =
        chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
    let fresh: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| match r.last_used {
            None => true,
            Some(at) => now.signed_duration_since(at) >= window,
        })
        .map(|(i, _)| i)
        .collect();

    if !fresh.is_empty() {
        return fresh[rng.random_range(0..fresh.len())];
    }

    // Everything used recently: least recently used wins
    records
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| r.last_used)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Apply `strategy` and return the chosen index with the concrete strategy
/// used. `stored` is the category's sequential position, updated in place.
pub fn choose<R: Rng>(
    strategy: RotationStrategy,
    records: &[UsageRecord],
    stored: &mut usize,
    params: &StrategyParams,
    rng: &mut R,
) -> (usize, RotationStrategy) {
    let resolved = match strategy {
        RotationStrategy::Auto => resolve_auto(records, params.auto_min_uses),
        other => other,
    };

    let index = match resolved {
        RotationStrategy::Sequential => {
            let (index, next) = sequential(records.len(), *stored);
            *stored = next;
            index
        }
        RotationStrategy::WeightedRandom => weighted_random(records, rng),
        RotationStrategy::LeastUsed => least_used(records, rng),
        RotationStrategy::PerformanceBased => {
            performance_based(records, params.exploration_bonus, params.top_k, rng)
        }
        RotationStrategy::TimeWindowed => time_windowed(records, params.now, params.window, rng),
        // resolve_auto never yields Auto
        RotationStrategy::Auto => least_used(records, rng),
    };

    trace!(strategy = %strategy, resolved = %resolved, index, "Rotation choice");
    (index, resolved)
}

fn sample_weighted<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || total <= 0.0 {
        return 0;
    }
    let mut target = rng.random_range(0.0..total);
    for (i, weight) in weights.iter().enumerate() {
        if target < *weight {
            return i;
        }
        target -= weight;
    }
    weights.len() - 1
}
