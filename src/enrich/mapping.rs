//! Map an enriched record onto template variable names
//!
//! Layers are applied in order and later layers only fill gaps:
//! 1. caller-supplied template variables, passed through
//! 2. direct mappings from `primary_data` (own names plus conventional aliases)
//! 3. business-logic labels and the conventional summary variables
//! 4. name-derived deterministic defaults for anything still required

use std::collections::BTreeMap;

use super::fields::{field_rank, format_fact, format_of, label_of, FactFormat};
use super::{EnrichedRecord, TopicType};
use crate::content::defaults::{DefaultSynthesizer, HashedDefaults};
use crate::template::extract_variables;

/// Variable name to rendered value
pub type VariableMap = BTreeMap<String, String>;

/// (template variable, primary_data field)
const DIRECT_ALIASES: &[(&str, &str)] = &[
    ("average_rate", "nightly_rate"),
    ("avg_nightly_rate", "nightly_rate"),
    ("nightly_price", "nightly_rate"),
    ("daily_rate", "nightly_rate"),
    ("occupancy", "occupancy_rate"),
    ("monthly_income", "monthly_revenue"),
    ("revenue", "monthly_revenue"),
    ("annual_income", "annual_revenue"),
    ("yearly_revenue", "annual_revenue"),
    ("expenses", "annual_expenses"),
    ("net_income", "net_operating_income"),
    ("roi", "roi_percent"),
    ("return_on_investment", "roi_percent"),
    ("home_price", "property_price"),
    ("purchase_price", "property_price"),
    ("regulations", "regulation"),
    ("rules", "regulation"),
    ("price", "average_cost"),
    ("cost", "average_cost"),
    ("typical_cost", "average_cost"),
    ("providers", "provider_count"),
    ("number_of_providers", "provider_count"),
    ("duration", "typical_duration"),
];

const SUBJECT_KEYS: &[&str] = &[
    "service",
    "product",
    "topic",
    "category",
    "property_type",
    "keyword",
    "niche",
];
const LOCATION_KEYS: &[&str] = &[
    "city", "location", "market", "area", "region", "town", "state",
];
const SUMMARY_LABELS: &[&str] = &["profitability", "price_tier", "market_strength", "demand_level"];

/// Merge the layers into a complete variable mapping.
///
/// `required` names are guaranteed to be present in the result.
pub fn transform(
    enriched: &EnrichedRecord,
    template_variables: &BTreeMap<String, String>,
    required: &[String],
) -> VariableMap {
    transform_with(enriched, template_variables, required, &HashedDefaults)
}

pub fn transform_with(
    enriched: &EnrichedRecord,
    template_variables: &BTreeMap<String, String>,
    required: &[String],
    defaults: &dyn DefaultSynthesizer,
) -> VariableMap {
    let mut mapped: VariableMap = template_variables.clone();

    // Direct facts under their own names
    for (field, value) in &enriched.primary_data {
        if format_of(field) == FactFormat::Internal {
            continue;
        }
        mapped
            .entry(field.clone())
            .or_insert_with(|| format_fact(field, value));
    }

    for (variable, field) in DIRECT_ALIASES {
        if let Some(value) = enriched.primary_data.get(*field) {
            mapped
                .entry(variable.to_string())
                .or_insert_with(|| format_fact(field, value));
        }
    }

    for (name, label) in &enriched.enriched_data {
        mapped.entry(name.clone()).or_insert_with(|| label.clone());
    }

    for (name, value) in conventional_variables(enriched, template_variables) {
        mapped.entry(name).or_insert(value);
    }

    for name in required {
        if !mapped.contains_key(name) {
            mapped.insert(name.clone(), defaults.synthesize(name));
        }
    }

    mapped
}

/// Variables every phrasing pattern may rely on regardless of topic
pub fn conventional_variables(
    enriched: &EnrichedRecord,
    template_variables: &BTreeMap<String, String>,
) -> VariableMap {
    let mut vars = VariableMap::new();

    let subject = SUBJECT_KEYS
        .iter()
        .find_map(|k| template_variables.get(*k))
        .cloned()
        .or_else(|| {
            template_variables
                .iter()
                .find(|(k, _)| !LOCATION_KEYS.contains(&k.as_str()))
                .map(|(_, v)| v.clone())
        })
        .unwrap_or_else(|| {
            match enriched.topic {
                TopicType::ShortTermRental => "short-term rentals",
                TopicType::LocalService => "local services",
                TopicType::Generic => "this topic",
            }
            .to_string()
        });
    vars.insert("subject".into(), subject);

    let location = LOCATION_KEYS
        .iter()
        .find_map(|k| template_variables.get(*k))
        .cloned()
        .unwrap_or_else(|| "your area".to_string());
    vars.insert("location".into(), location);

    let summary = SUMMARY_LABELS
        .iter()
        .find_map(|k| enriched.enriched_data.get(*k))
        .cloned()
        .unwrap_or_else(|| "worth a closer look".to_string());
    vars.insert("summary".into(), summary);

    vars.insert(
        "answer".into(),
        enriched
            .enriched_data
            .get("answer")
            .cloned()
            .unwrap_or_else(|| "It depends".to_string()),
    );

    let facts = display_facts(enriched, template_variables);
    let headline = facts
        .first()
        .map(|(label, value)| {
            let label = label.to_lowercase();
            format!("{} {label} of {value}", indefinite_article(&label))
        })
        .unwrap_or_else(|| "a limited set of local figures".to_string());
    vars.insert("headline_fact".into(), headline);

    let rows: Vec<String> = facts
        .iter()
        .map(|(label, value)| format!("| {label} | {value} |"))
        .collect();
    let table = if rows.is_empty() {
        "| Detail | Value |\n|---|---|\n| Data coverage | limited |".to_string()
    } else {
        format!("| Detail | Value |\n|---|---|\n{}", rows.join("\n"))
    };
    vars.insert("fact_table".into(), table);

    let list = if facts.is_empty() {
        "- Local data is limited, so compare several options".to_string()
    } else {
        facts
            .iter()
            .map(|(label, value)| format!("- {label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    vars.insert("fact_list".into(), list);
    vars.insert("fact_count".into(), facts.len().to_string());
    let confidence = if enriched.data_quality >= 0.8 {
        "high"
    } else if enriched.data_quality >= 0.6 {
        "moderate"
    } else {
        "limited"
    };
    vars.insert("data_confidence".into(), confidence.to_string());

    vars
}

fn indefinite_article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Displayable (label, value) pairs from `primary_data`, seeds excluded,
/// most important fields first
pub fn display_facts(
    enriched: &EnrichedRecord,
    template_variables: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut fields: Vec<_> = enriched
        .primary_data
        .iter()
        .filter(|(field, _)| !template_variables.contains_key(*field))
        .filter(|(field, _)| format_of(field) != FactFormat::Internal)
        .filter(|(_, value)| value.is_number() || value.is_string())
        .collect();
    fields.sort_by_key(|(field, _)| field_rank(field));

    fields
        .into_iter()
        .map(|(field, value)| (label_of(field), format_fact(field, value)))
        .collect()
}

/// Variables `pattern` references that `transformed` does not supply
pub fn validate_mapping(pattern: &str, transformed: &VariableMap) -> Vec<String> {
    extract_variables(pattern)
        .into_iter()
        .filter(|name| !transformed.contains_key(name))
        .collect()
}
