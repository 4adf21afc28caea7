//! Business-logic mappings
//!
//! Each rule classifies numeric facts into a narrative label using the
//! cut-points in [`BusinessThresholds`]. Rules are deterministic and return
//! `None` when the facts they need are absent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Facts;
use crate::config::BusinessThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessRule {
    Profitability,
    MarketStrength,
    Ranking,
    RegulationStatus,
    PriceTier,
    DemandLevel,
    InvestmentOutlook,
    Answer,
}

impl BusinessRule {
    /// Evaluation order; later rules may read labels produced by earlier ones
    pub const ALL: [BusinessRule; 8] = [
        BusinessRule::Profitability,
        BusinessRule::MarketStrength,
        BusinessRule::Ranking,
        BusinessRule::RegulationStatus,
        BusinessRule::PriceTier,
        BusinessRule::DemandLevel,
        BusinessRule::InvestmentOutlook,
        BusinessRule::Answer,
    ];

    /// The variable name the label is published under
    pub fn name(&self) -> &'static str {
        match self {
            BusinessRule::Profitability => "profitability",
            BusinessRule::MarketStrength => "market_strength",
            BusinessRule::Ranking => "ranking",
            BusinessRule::RegulationStatus => "regulation_status",
            BusinessRule::PriceTier => "price_tier",
            BusinessRule::DemandLevel => "demand_level",
            BusinessRule::InvestmentOutlook => "investment_outlook",
            BusinessRule::Answer => "answer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|rule| rule.name() == name)
    }

    pub fn apply(
        &self,
        facts: &Facts,
        labels: &BTreeMap<String, String>,
        t: &BusinessThresholds,
    ) -> Option<String> {
        let number = |field: &str| facts.get(field).and_then(|v| v.as_f64());

        let label = match self {
            BusinessRule::Profitability => {
                let roi = number("roi_percent")?;
                let occupancy = number("occupancy_rate")?;
                if roi >= t.highly_profitable_roi && occupancy >= t.highly_profitable_occupancy {
                    "highly profitable"
                } else if roi >= t.profitable_roi && occupancy >= t.profitable_occupancy {
                    "profitable"
                } else if roi >= t.moderately_profitable_roi {
                    "moderately profitable"
                } else {
                    "marginally profitable"
                }
            }
            BusinessRule::MarketStrength => {
                let occupancy = number("occupancy_rate")?;
                if occupancy >= t.very_strong_occupancy {
                    "very strong"
                } else if occupancy >= t.strong_occupancy {
                    "strong"
                } else if occupancy >= t.moderate_occupancy {
                    "moderate"
                } else {
                    "developing"
                }
            }
            BusinessRule::Ranking => {
                let roi = number("roi_percent")?;
                if roi >= t.top_tier_roi {
                    "top-tier"
                } else if roi >= t.above_average_roi {
                    "above average"
                } else if roi >= t.average_roi {
                    "average"
                } else {
                    "below average"
                }
            }
            BusinessRule::RegulationStatus => {
                let level = facts.get("regulation_level").and_then(|v| v.as_str())?;
                match level {
                    "strict" => "tightly regulated",
                    "moderate" => "moderately regulated",
                    "permissive" => "lightly regulated",
                    _ => "subject to local rules",
                }
            }
            BusinessRule::PriceTier => {
                let cost = number("average_cost")?;
                if cost <= t.budget_price_max {
                    "budget-friendly"
                } else if cost <= t.standard_price_max {
                    "mid-range"
                } else {
                    "premium"
                }
            }
            BusinessRule::DemandLevel => {
                let demand = number("demand_index")?;
                if demand >= t.high_demand_index {
                    "high"
                } else if demand >= t.moderate_demand_index {
                    "moderate"
                } else {
                    "low"
                }
            }
            BusinessRule::InvestmentOutlook => {
                let growth = number("growth_rate")?;
                let profitable = labels
                    .get("profitability")
                    .map(|p| p == "highly profitable" || p == "profitable")
                    .unwrap_or(false);
                if growth >= t.strong_growth_rate && profitable {
                    "promising"
                } else if growth >= t.stable_growth_rate {
                    "stable"
                } else {
                    "cautious"
                }
            }
            BusinessRule::Answer => {
                if let Some(profitability) = labels.get("profitability") {
                    match profitability.as_str() {
                        "highly profitable" | "profitable" => "Yes",
                        "moderately profitable" => "It can be",
                        _ => "Usually not",
                    }
                } else {
                    match labels.get("demand_level")?.as_str() {
                        "high" => "Yes",
                        "moderate" => "It depends",
                        _ => "Not usually",
                    }
                }
            }
        };

        Some(label.to_string())
    }
}

/// Apply every rule in order, collecting the labels that could be computed
pub fn derive_labels(facts: &Facts, thresholds: &BusinessThresholds) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    for rule in BusinessRule::ALL {
        if let Some(label) = rule.apply(facts, &labels, thresholds) {
            labels.insert(rule.name().to_string(), label);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts(pairs: &[(&str, serde_json::Value)]) -> Facts {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_profitability_cut_points() {
        let t = BusinessThresholds::default();
        let rule = BusinessRule::Profitability;
        let none = BTreeMap::new();

        let high = facts(&[("roi_percent", json!(18.0)), ("occupancy_rate", json!(70))]);
        assert_eq!(rule.apply(&high, &none, &t).unwrap(), "highly profitable");

        let low_occupancy = facts(&[("roi_percent", json!(19.0)), ("occupancy_rate", json!(65))]);
        assert_eq!(rule.apply(&low_occupancy, &none, &t).unwrap(), "profitable");

        let moderate = facts(&[("roi_percent", json!(7.0)), ("occupancy_rate", json!(80))]);
        assert_eq!(rule.apply(&moderate, &none, &t).unwrap(), "moderately profitable");

        let marginal = facts(&[("roi_percent", json!(5.9)), ("occupancy_rate", json!(80))]);
        assert_eq!(rule.apply(&marginal, &none, &t).unwrap(), "marginally profitable");
    }

    #[test]
    fn test_rules_skip_missing_inputs() {
        let labels = derive_labels(&Facts::new(), &BusinessThresholds::default());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_answer_follows_profitability() {
        let labels = derive_labels(
            &facts(&[
                ("roi_percent", json!(19.5)),
                ("occupancy_rate", json!(72)),
                ("growth_rate", json!(6.8)),
            ]),
            &BusinessThresholds::default(),
        );
        assert_eq!(labels["profitability"], "highly profitable");
        assert_eq!(labels["ranking"], "top-tier");
        assert_eq!(labels["investment_outlook"], "promising");
        assert_eq!(labels["answer"], "Yes");
    }

    #[test]
    fn test_answer_falls_back_to_demand() {
        let labels = derive_labels(
            &facts(&[("demand_index", json!(50)), ("average_cost", json!(120))]),
            &BusinessThresholds::default(),
        );
        assert_eq!(labels["demand_level"], "moderate");
        assert_eq!(labels["price_tier"], "budget-friendly");
        assert_eq!(labels["answer"], "It depends");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            BusinessRule::from_name("market_strength"),
            Some(BusinessRule::MarketStrength)
        );
        assert_eq!(BusinessRule::from_name("nope"), None);
    }
}
