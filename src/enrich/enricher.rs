//! Build enriched records from assignments

use serde_json::{json, Value};
use tracing::debug;

use super::business::derive_labels;
use super::knowledge::KnowledgeBase;
use super::{EnrichedRecord, Facts, TopicType};
use crate::config::{BusinessThresholds, EnrichmentSettings, GeneratorConfig};
use crate::error::Result;
use crate::plan::Assignment;

/// Looks up topic facts for an assignment and derives the rest
#[derive(Debug, Clone)]
pub struct Enricher {
    knowledge: KnowledgeBase,
    settings: EnrichmentSettings,
    thresholds: BusinessThresholds,
}

impl Enricher {
    pub fn new(knowledge: KnowledgeBase, config: &GeneratorConfig) -> Self {
        Self {
            knowledge,
            settings: config.enrichment.clone(),
            thresholds: config.business.clone(),
        }
    }

    /// Enricher over the built-in knowledge tables
    pub fn builtin(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self::new(KnowledgeBase::builtin()?, config))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Never fails: unknown keys fall back to the table defaults and lower the
    /// record's `data_quality`.
    pub fn enrich(&self, topic: &TopicType, assignment: &Assignment) -> EnrichedRecord {
        self.enrich_with(topic, assignment, &Facts::new())
    }

    /// Like [`Enricher::enrich`], with externally supplied facts that rank
    /// below knowledge-table hits and above table defaults. They do not raise
    /// `data_quality`.
    pub fn enrich_with(
        &self,
        topic: &TopicType,
        assignment: &Assignment,
        supplied: &Facts,
    ) -> EnrichedRecord {
        let mut primary = Facts::new();
        let mut sources = Vec::new();

        for (name, value) in assignment {
            primary.insert(name.clone(), Value::String(value.clone()));
        }
        if !assignment.is_empty() {
            sources.push("seed".to_string());
        }

        let mut achieved = 0.0;
        let mut possible = 0.0;
        let mut misses = Vec::new();

        if let Some(knowledge) = self.knowledge.topic(topic) {
            for table in &knowledge.tables {
                let found = table.key_in(assignment).and_then(|raw| {
                    table
                        .lookup(raw)
                        .map(|facts| (super::knowledge::normalize_key(raw), facts))
                });

                match found {
                    Some((key, facts)) => {
                        merge_missing(&mut primary, facts);
                        achieved += table.weight;
                        possible += table.weight;
                        sources.push(format!("knowledge:{}:{}:{}", topic, table.name, key));
                    }
                    None => {
                        let applicable = table.required || table.key_in(assignment).is_some();
                        if applicable {
                            achieved += table.weight * self.settings.default_data_quality;
                            possible += table.weight;
                            debug!(
                                "No {} entry for {:?}, using defaults",
                                table.name,
                                table.key_in(assignment)
                            );
                        }
                        misses.push(table);
                    }
                }
            }
        }

        if !supplied.is_empty() {
            merge_missing(&mut primary, supplied);
            sources.push("generated".to_string());
        }
        for table in misses {
            merge_missing(&mut primary, &table.default);
            sources.push(format!("default:{}:{}", topic, table.name));
        }

        if derive_facts(topic, &mut primary, &self.settings) {
            sources.push("derived".to_string());
        }

        let data_quality = if possible > 0.0 {
            (achieved / possible).clamp(0.0, 1.0)
        } else {
            self.settings.default_data_quality
        };

        let enriched_data = derive_labels(&primary, &self.thresholds);

        debug!(
            topic = %topic,
            data_quality,
            labels = enriched_data.len(),
            "Enriched assignment"
        );

        EnrichedRecord {
            topic: topic.clone(),
            primary_data: primary,
            enriched_data,
            data_quality,
            data_sources: sources,
        }
    }
}

fn merge_missing(target: &mut Facts, facts: &Facts) {
    for (key, value) in facts {
        target.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply the topic's arithmetic. Returns whether anything was derived.
pub fn derive_facts(topic: &TopicType, facts: &mut Facts, settings: &EnrichmentSettings) -> bool {
    let number = |facts: &Facts, field: &str| facts.get(field).and_then(|v| v.as_f64());

    match topic {
        TopicType::ShortTermRental => {
            let (Some(base_rate), Some(occupancy), Some(base_price)) = (
                number(facts, "base_nightly_rate"),
                number(facts, "occupancy_rate"),
                number(facts, "base_property_price"),
            ) else {
                return false;
            };
            let rate_multiplier = number(facts, "rate_multiplier").unwrap_or(1.0);
            let price_multiplier = number(facts, "price_multiplier").unwrap_or(1.0);

            let nightly_rate = base_rate * rate_multiplier;
            let property_price = base_price * price_multiplier;
            let monthly_revenue = nightly_rate * settings.days_per_month * occupancy / 100.0;
            let annual_revenue = monthly_revenue * 12.0;
            let annual_expenses = annual_revenue * settings.expense_ratio;
            let net_operating_income = annual_revenue - annual_expenses;

            facts.insert("nightly_rate".into(), json!(round2(nightly_rate)));
            facts.insert("property_price".into(), json!(round2(property_price)));
            facts.insert("monthly_revenue".into(), json!(round2(monthly_revenue)));
            facts.insert("annual_revenue".into(), json!(round2(annual_revenue)));
            facts.insert("annual_expenses".into(), json!(round2(annual_expenses)));
            facts.insert(
                "net_operating_income".into(),
                json!(round2(net_operating_income)),
            );
            if property_price > 0.0 {
                facts.insert(
                    "roi_percent".into(),
                    json!(round2(net_operating_income / property_price * 100.0)),
                );
            }
            if net_operating_income > 0.0 {
                facts.insert(
                    "payback_years".into(),
                    json!(round2(property_price / net_operating_income)),
                );
            }
            true
        }
        TopicType::LocalService => {
            let Some(base_cost) = number(facts, "base_cost") else {
                return false;
            };
            let multiplier = number(facts, "cost_multiplier").unwrap_or(1.0);
            let average_cost = base_cost * multiplier;

            facts.insert("average_cost".into(), json!(round2(average_cost)));
            facts.insert(
                "cost_low".into(),
                json!(round2(average_cost * settings.cost_low_factor)),
            );
            facts.insert(
                "cost_high".into(),
                json!(round2(average_cost * settings.cost_high_factor)),
            );

            if let (Some(population), Some(density)) = (
                number(facts, "population"),
                number(facts, "provider_density"),
            ) {
                let providers = (population / 10_000.0 * density).round() as u64;
                facts.insert("provider_count".into(), json!(providers));
            }
            if let Some(income) = number(facts, "median_income").filter(|i| *i > 0.0) {
                facts.insert(
                    "affordability_percent".into(),
                    json!(round2(average_cost / (income / 12.0) * 100.0)),
                );
            }
            true
        }
        TopicType::Generic => false,
    }
}
