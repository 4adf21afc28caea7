//! Tunable constants for the generation pipeline.
//!
//! Every threshold the pipeline classifies against lives here rather than in
//! the code that uses it. The defaults are tuning values, not derived ones, so
//! callers are expected to override them from a TOML file or the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

pub mod loader;

/// Top-level configuration for page generation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub scale: ScaleThresholds,
    pub seo: SeoLengths,
    pub quality: QualityWeights,
    pub business: BusinessThresholds,
    pub enrichment: EnrichmentSettings,
    pub rotation: RotationSettings,
}

/// Cardinality bounds the planner warns about
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaleThresholds {
    pub large: u64,
    pub very_large: u64,
    pub small: u64,
}

impl Default for ScaleThresholds {
    fn default() -> Self {
        Self {
            large: 10_000,
            very_large: 50_000,
            small: 10,
        }
    }
}

/// Recommended lengths for rendered SEO fields, in characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeoLengths {
    pub title_min: usize,
    pub title_max: usize,
    pub meta_min: usize,
    pub meta_max: usize,
}

impl Default for SeoLengths {
    fn default() -> Self {
        Self {
            title_min: 30,
            title_max: 60,
            meta_min: 120,
            meta_max: 160,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WordCountBonus {
    pub min_words: usize,
    pub bonus: u32,
}

/// Weights for the page quality score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QualityWeights {
    pub base: u32,
    pub data_rich_bonus: u32,
    pub data_rich_cap: u32,
    pub diversity_bonus: u32,
    pub diversity_cap: u32,
    pub word_bonuses: Vec<WordCountBonus>,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            base: 50,
            data_rich_bonus: 5,
            data_rich_cap: 15,
            diversity_bonus: 2,
            diversity_cap: 10,
            word_bonuses: vec![
                WordCountBonus {
                    min_words: 300,
                    bonus: 10,
                },
                WordCountBonus {
                    min_words: 600,
                    bonus: 10,
                },
                WordCountBonus {
                    min_words: 1000,
                    bonus: 10,
                },
            ],
        }
    }
}

/// Cut-points used by the business-logic mappings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BusinessThresholds {
    pub highly_profitable_roi: f64,
    pub highly_profitable_occupancy: f64,
    pub profitable_roi: f64,
    pub profitable_occupancy: f64,
    pub moderately_profitable_roi: f64,
    pub very_strong_occupancy: f64,
    pub strong_occupancy: f64,
    pub moderate_occupancy: f64,
    pub top_tier_roi: f64,
    pub above_average_roi: f64,
    pub average_roi: f64,
    pub budget_price_max: f64,
    pub standard_price_max: f64,
    pub high_demand_index: f64,
    pub moderate_demand_index: f64,
    pub strong_growth_rate: f64,
    pub stable_growth_rate: f64,
}

impl Default for BusinessThresholds {
    fn default() -> Self {
        Self {
            highly_profitable_roi: 18.0,
            highly_profitable_occupancy: 70.0,
            profitable_roi: 12.0,
            profitable_occupancy: 60.0,
            moderately_profitable_roi: 6.0,
            very_strong_occupancy: 75.0,
            strong_occupancy: 65.0,
            moderate_occupancy: 55.0,
            top_tier_roi: 18.0,
            above_average_roi: 12.0,
            average_roi: 6.0,
            budget_price_max: 150.0,
            standard_price_max: 400.0,
            high_demand_index: 70.0,
            moderate_demand_index: 40.0,
            strong_growth_rate: 5.0,
            stable_growth_rate: 3.0,
        }
    }
}

/// Arithmetic constants for derived facts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub days_per_month: f64,
    pub expense_ratio: f64,
    pub cost_low_factor: f64,
    pub cost_high_factor: f64,
    /// Quality assigned to a record built entirely from the fallback defaults
    pub default_data_quality: f64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            days_per_month: 30.0,
            expense_ratio: 0.35,
            cost_low_factor: 0.75,
            cost_high_factor: 1.4,
            default_data_quality: 0.4,
        }
    }
}

/// Rotation engine tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RotationSettings {
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    pub flush_batch_size: usize,
    pub exploration_bonus: f64,
    pub performance_top_k: usize,
    pub auto_min_uses: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(3600),
            flush_batch_size: 50,
            exploration_bonus: 0.1,
            performance_top_k: 3,
            auto_min_uses: 3,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject settings that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.scale.large >= self.scale.very_large {
            problems.push(format!(
                "scale.large ({}) must be below scale.very_large ({})",
                self.scale.large, self.scale.very_large
            ));
        }
        if self.seo.title_min > self.seo.title_max {
            problems.push("seo.title_min exceeds seo.title_max".to_string());
        }
        if self.seo.meta_min > self.seo.meta_max {
            problems.push("seo.meta_min exceeds seo.meta_max".to_string());
        }
        if self.rotation.flush_batch_size == 0 {
            problems.push("rotation.flush_batch_size must be at least 1".to_string());
        }
        if self.rotation.performance_top_k == 0 {
            problems.push("rotation.performance_top_k must be at least 1".to_string());
        }
        if self.enrichment.cost_low_factor > self.enrichment.cost_high_factor {
            problems.push("enrichment.cost_low_factor exceeds cost_high_factor".to_string());
        }
        if !(0.0..=1.0).contains(&self.enrichment.expense_ratio) {
            problems.push("enrichment.expense_ratio must be within 0..=1".to_string());
        }
        if !(0.0..=1.0).contains(&self.enrichment.default_data_quality) {
            problems.push("enrichment.default_data_quality must be within 0..=1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(problems.join("; ")))
        }
    }
}
