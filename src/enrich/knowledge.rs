//! Topic-keyed knowledge tables

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Facts, TopicType};
use crate::error::Result;

const BUILTIN_KNOWLEDGE: &str = include_str!("knowledge.json");

/// Facts for one dimension of a topic, e.g. market data keyed by city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactTable {
    pub name: String,
    /// Assignment variables that can supply the lookup key, first match wins
    pub key_variables: Vec<String>,
    /// Share of the record's data quality this table accounts for
    pub weight: f64,
    /// When no key variable is bound, a required table still counts as a miss
    #[serde(default)]
    pub required: bool,
    pub default: Facts,
    /// Entries keyed by [`normalize_key`] output
    pub entries: HashMap<String, Facts>,
}

impl FactTable {
    /// The raw key value from the assignment, if any key variable is bound
    pub fn key_in<'a>(&self, assignment: &'a crate::plan::Assignment) -> Option<&'a str> {
        self.key_variables
            .iter()
            .find_map(|var| assignment.get(var))
            .map(String::as_str)
    }

    pub fn lookup(&self, raw_key: &str) -> Option<&Facts> {
        self.entries.get(&normalize_key(raw_key))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicKnowledge {
    pub tables: Vec<FactTable>,
}

/// All knowledge tables, keyed by topic name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase {
    topics: HashMap<String, TopicKnowledge>,
}

impl KnowledgeBase {
    /// Tables shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_KNOWLEDGE)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut base: KnowledgeBase = serde_json::from_str(content)?;
        base.normalize_entries();
        Ok(base)
    }

    pub fn topic(&self, topic: &TopicType) -> Option<&TopicKnowledge> {
        self.topics.get(topic.as_str())
    }

    /// Merge another knowledge base into this one. Tables with the same name
    /// gain the other's entries, overriding existing keys.
    pub fn merge(&mut self, other: KnowledgeBase) {
        for (topic, knowledge) in other.topics {
            let target = self.topics.entry(topic).or_default();
            for table in knowledge.tables {
                match target.tables.iter_mut().find(|t| t.name == table.name) {
                    Some(existing) => existing.entries.extend(table.entries),
                    None => target.tables.push(table),
                }
            }
        }
    }

    fn normalize_entries(&mut self) {
        for knowledge in self.topics.values_mut() {
            for table in &mut knowledge.tables {
                table.entries = std::mem::take(&mut table.entries)
                    .into_iter()
                    .map(|(key, facts)| (normalize_key(&key), facts))
                    .collect();
            }
        }
    }
}

/// "  San_Diego, CA " -> "san diego"
pub fn normalize_key(raw: &str) -> String {
    let head = raw.split(',').next().unwrap_or(raw);
    head.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
