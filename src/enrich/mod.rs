//! Data enrichment and variable mapping
//!
//! Turns a raw assignment ("city" = "Austin") into an [`EnrichedRecord`] of
//! looked-up and derived facts plus narrative labels, then maps that record
//! onto the variable names a phrasing pattern expects.

pub mod business;
pub mod enricher;
pub mod fields;
pub mod knowledge;
pub mod mapping;

pub use business::BusinessRule;
pub use enricher::Enricher;
pub use knowledge::{FactTable, KnowledgeBase, TopicKnowledge};
pub use mapping::{transform, validate_mapping};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw facts keyed by field name
pub type Facts = BTreeMap<String, serde_json::Value>;

/// Subject area a knowledge table describes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    ShortTermRental,
    LocalService,
    /// No knowledge table; only seed values are available
    Generic,
}

const RENTAL_MARKERS: &[&str] = &[
    "airbnb",
    "vrbo",
    "short-term rental",
    "short term rental",
    "vacation rental",
    "rental property",
];
const RENTAL_KEYS: &[&str] = &["property_type", "rental_type"];
const SERVICE_KEYS: &[&str] = &["service", "trade", "contractor"];

impl TopicType {
    /// Pick the knowledge topic from the template pattern and bound variable
    /// names. Rental phrasing wins over service variables.
    pub fn detect<I, S>(pattern: &str, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lower = pattern.to_lowercase();
        let names: Vec<String> = variables
            .into_iter()
            .map(|v| v.as_ref().to_lowercase())
            .collect();

        if RENTAL_MARKERS.iter().any(|m| lower.contains(m))
            || names.iter().any(|n| RENTAL_KEYS.contains(&n.as_str()))
        {
            TopicType::ShortTermRental
        } else if names.iter().any(|n| SERVICE_KEYS.contains(&n.as_str())) {
            TopicType::LocalService
        } else {
            TopicType::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicType::ShortTermRental => "short_term_rental",
            TopicType::LocalService => "local_service",
            TopicType::Generic => "generic",
        }
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts and labels computed for one assignment. Never shared across
/// assignments and not modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub topic: TopicType,
    pub primary_data: Facts,
    pub enriched_data: BTreeMap<String, String>,
    /// Completeness in `0.0..=1.0`
    pub data_quality: f64,
    pub data_sources: Vec<String>,
}

impl EnrichedRecord {
    pub fn number(&self, field: &str) -> Option<f64> {
        self.primary_data.get(field).and_then(|v| v.as_f64())
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.primary_data.get(field).and_then(|v| v.as_str())
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.enriched_data.get(name).map(String::as_str)
    }

    /// Whether any fact came from the fallback defaults
    pub fn used_defaults(&self) -> bool {
        self.data_sources.iter().any(|s| s.starts_with("default:"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_topic() {
        assert_eq!(
            TopicType::detect("Airbnb profitability in {city}", ["city"]),
            TopicType::ShortTermRental
        );
        assert_eq!(
            TopicType::detect("{property_type} rentals in {city}", ["property_type", "city"]),
            TopicType::ShortTermRental
        );
        assert_eq!(
            TopicType::detect("Best {service} in {city}", ["service", "city"]),
            TopicType::LocalService
        );
        assert_eq!(
            TopicType::detect("{topic} ideas", ["topic"]),
            TopicType::Generic
        );
    }
}
