//! Text-in/text-out generation collaborator
//!
//! The core never depends on a model. Callers plug in a [`TextGenerator`];
//! anything it returns is checked before use, and any failure falls back to
//! the deterministic paths.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::enrich::{EnrichedRecord, Enricher, Facts, TopicType};
use crate::error::Error;
use crate::plan::Assignment;
use crate::template::extract_variables;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s*").expect("Valid regex pattern"));
static FACT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_ ]*?)\s*[:=]\s*\$?([0-9][0-9,]*(?:\.[0-9]+)?)\s*%?\s*$")
        .expect("Valid regex pattern")
});

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String>;
}

/// Trimmed text, or `None` when it is empty or still carries placeholders.
pub fn accept_generated_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let unresolved = extract_variables(trimmed);
    if !unresolved.is_empty() {
        debug!("Rejecting generated text with placeholders {:?}", unresolved);
        return None;
    }
    Some(trimmed.to_string())
}

/// Call the generator and accept its reply, mapping both a failed call and
/// an unusable reply to [`Error::Collaborator`].
pub async fn generate_text(
    generator: &dyn TextGenerator,
    prompt: &str,
    temperature: f32,
    max_tokens: u32,
) -> crate::error::Result<String> {
    let text = generator
        .generate(prompt, temperature, max_tokens)
        .await
        .map_err(|e| Error::Collaborator(e.to_string()))?;
    accept_generated_text(&text).ok_or_else(|| {
        Error::Collaborator("Generated text was empty or contained placeholders".to_string())
    })
}

/// Ask for `count` candidate values for a variable, one per line.
///
/// List bullets and numbering are stripped, duplicates (case-insensitive) and
/// lines with placeholders dropped. A generator failure yields no values.
pub async fn suggest_values(
    generator: &dyn TextGenerator,
    variable: &str,
    topic: &str,
    count: usize,
) -> Vec<String> {
    let prompt = format!(
        "List {count} distinct values for \"{variable}\" relevant to {topic}. \
         One value per line, no commentary."
    );
    let response = match generator.generate(&prompt, 0.7, 400).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Value suggestion for '{}' failed: {}", variable, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    response
        .lines()
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter_map(|line| accept_generated_text(&line))
        .filter(|value| seen.insert(value.to_lowercase()))
        .take(count)
        .collect()
}

/// Parse `name: number` lines into facts keyed by snake_case name.
pub fn parse_fact_lines(text: &str) -> Facts {
    let mut facts = Facts::new();
    for line in text.lines() {
        let line = LIST_MARKER.replace(line, "");
        let Some(caps) = FACT_LINE.captures(&line) else {
            continue;
        };
        let name = caps[1]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        let number = caps[2].replace(',', "");
        if let Ok(value) = number.parse::<f64>() {
            if let Some(value) = serde_json::Number::from_f64(value) {
                facts.insert(name, Value::Number(value));
            }
        }
    }
    facts
}

/// Enrich with facts proposed by the generator for the knowledge fields
/// `fields`. Any collaborator failure, or a reply with no usable facts,
/// produces the plain default-backed record.
pub async fn seed_from_generator(
    generator: &dyn TextGenerator,
    enricher: &Enricher,
    topic: &TopicType,
    assignment: &Assignment,
    fields: &[&str],
) -> EnrichedRecord {
    let subject = assignment
        .iter()
        .map(|(k, v)| format!("{k} = {v}"))
        .collect::<Vec<_>>()
        .join(", ");
    let prompt = format!(
        "Estimate the following figures for {subject} ({topic}). \
         Answer with one `name: number` line each: {}",
        fields.join(", ")
    );

    let supplied = match generate_text(generator, &prompt, 0.2, 300).await {
        Ok(text) => {
            let wanted: HashSet<&str> = fields.iter().copied().collect();
            parse_fact_lines(&text)
                .into_iter()
                .filter(|(name, _)| wanted.contains(name.as_str()))
                .collect()
        }
        Err(e) => {
            warn!("Fact generation failed, using defaults: {}", e);
            Facts::new()
        }
    };

    enricher.enrich_with(topic, assignment, &supplied)
}

/// Scripted generator for tests: replies in order, records prompts
#[derive(Default, Clone)]
pub struct MockTextGenerator {
    responses: Arc<Mutex<Vec<Result<String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_response(&self, response: Result<String>) {
        self.responses.lock().await.push(response);
    }

    pub async fn add_success_response(&self, text: &str) {
        self.add_response(Ok(text.to_string())).await;
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        self.prompts.lock().await.push(prompt.to_string());
        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            anyhow::bail!("No scripted response left");
        }
        responses.remove(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    fn assignment(pairs: &[(&str, &str)]) -> Assignment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_accept_generated_text() {
        assert_eq!(accept_generated_text("  Austin \n"), Some("Austin".to_string()));
        assert_eq!(accept_generated_text("   "), None);
        assert_eq!(accept_generated_text("Visit {city} today"), None);
        assert_eq!(accept_generated_text("See [city]"), None);
    }

    #[test]
    fn test_parse_fact_lines() {
        let facts = parse_fact_lines(
            "- Base nightly rate: $142\n2. occupancy_rate = 64%\nnotes: none\nmedian income: 71,500",
        );
        assert_eq!(facts["base_nightly_rate"], serde_json::json!(142.0));
        assert_eq!(facts["occupancy_rate"], serde_json::json!(64.0));
        assert_eq!(facts["median_income"], serde_json::json!(71500.0));
        assert!(!facts.contains_key("notes"));
    }

    #[tokio::test]
    async fn test_suggest_values_cleans_list() {
        let generator = MockTextGenerator::new();
        generator
            .add_success_response("1. Austin\n2) Denver\n- austin\n* {city}\n\n• Miami\nBoise")
            .await;
        let values = suggest_values(&generator, "city", "short-term rentals", 3).await;
        assert_eq!(values, vec!["Austin", "Denver", "Miami"]);
        assert!(generator.prompts().await[0].contains("\"city\""));
    }

    #[tokio::test]
    async fn test_generate_text_maps_failures() {
        let generator = MockTextGenerator::new();
        generator.add_success_response("Fill in {city}").await;
        generator.add_success_response(" Fine copy ").await;
        assert!(matches!(
            generate_text(&generator, "p", 0.5, 10).await,
            Err(Error::Collaborator(_))
        ));
        assert_eq!(generate_text(&generator, "p", 0.5, 10).await.unwrap(), "Fine copy");
        assert!(matches!(
            generate_text(&generator, "p", 0.5, 10).await,
            Err(Error::Collaborator(_))
        ));
    }

    #[tokio::test]
    async fn test_suggest_values_failure_is_empty() {
        let generator = MockTextGenerator::new();
        generator
            .add_response(Err(anyhow::anyhow!("rate limited")))
            .await;
        assert!(suggest_values(&generator, "city", "rentals", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_seed_from_generator_fills_unknown_city() {
        let enricher = Enricher::builtin(&GeneratorConfig::default()).unwrap();
        let generator = MockTextGenerator::new();
        generator
            .add_success_response("base_nightly_rate: 132\nunrelated_field: 9")
            .await;
        let record = seed_from_generator(
            &generator,
            &enricher,
            &TopicType::ShortTermRental,
            &assignment(&[("city", "Toronto")]),
            &["base_nightly_rate", "occupancy_rate"],
        )
        .await;
        assert_eq!(record.number("nightly_rate"), Some(132.0));
        assert!(!record.primary_data.contains_key("unrelated_field"));
        assert!(record.data_quality < 0.6);
    }

    #[tokio::test]
    async fn test_seed_from_generator_falls_back_on_error() {
        let enricher = Enricher::builtin(&GeneratorConfig::default()).unwrap();
        let generator = MockTextGenerator::new();
        let record = seed_from_generator(
            &generator,
            &enricher,
            &TopicType::ShortTermRental,
            &assignment(&[("city", "Toronto")]),
            &["base_nightly_rate"],
        )
        .await;
        assert_eq!(record, enricher.enrich(&TopicType::ShortTermRental, &assignment(&[("city", "Toronto")])));
    }
}
