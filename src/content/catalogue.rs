//! Phrasing catalogue
//!
//! Variants are keyed by (content type, section kind). Kinds a content type
//! does not define fall back to the generic entries.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::content_type::ContentType;
use crate::error::{Error, Result};

const BUILTIN_CATALOGUE: &str = include_str!("catalogue.yaml");

/// Every page has these sections, so the generic fallback must define them
pub const REQUIRED_GENERIC_KINDS: [SectionKind; 3] = [
    SectionKind::Introduction,
    SectionKind::MainValue,
    SectionKind::CallToAction,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Introduction,
    MainValue,
    DataTable,
    KeyFacts,
    Considerations,
    Faq,
    CallToAction,
    /// Section declared by the template itself
    Custom,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Introduction => "introduction",
            SectionKind::MainValue => "main_value",
            SectionKind::DataTable => "data_table",
            SectionKind::KeyFacts => "key_facts",
            SectionKind::Considerations => "considerations",
            SectionKind::Faq => "faq",
            SectionKind::CallToAction => "call_to_action",
            SectionKind::Custom => "custom",
        }
    }

    /// Kinds that may appear between the main value and the call to action
    pub fn is_supporting(&self) -> bool {
        matches!(
            self,
            SectionKind::DataTable
                | SectionKind::KeyFacts
                | SectionKind::Considerations
                | SectionKind::Faq
        )
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered supporting-section structures a page body can take
pub static SUPPORTING_STRUCTURES: Lazy<Vec<Vec<SectionKind>>> = Lazy::new(|| {
    use SectionKind::*;
    vec![
        vec![DataTable, KeyFacts, Faq],
        vec![KeyFacts, Considerations],
        vec![DataTable, Considerations, Faq],
        vec![KeyFacts, DataTable],
        vec![Considerations, Faq, KeyFacts],
    ]
});

/// Stable identifier for a supporting structure, used as a rotation variant
pub fn structure_id(structure: &[SectionKind]) -> String {
    structure
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternVariant {
    pub id: String,
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct CatalogueEntry {
    content_type: ContentType,
    section: SectionKind,
    variants: Vec<PatternVariant>,
}

#[derive(Debug, Clone, Default)]
pub struct PatternCatalogue {
    entries: HashMap<(ContentType, SectionKind), Vec<PatternVariant>>,
}

impl PatternCatalogue {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOGUE)
    }

    /// Parse a catalogue document. Entries with the same key are concatenated.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let parsed: Vec<CatalogueEntry> = serde_yaml::from_str(content)?;
        let mut catalogue = Self::default();
        for entry in parsed {
            if entry.variants.is_empty() {
                return Err(Error::Config(format!(
                    "catalogue entry {}/{} has no variants",
                    entry.content_type, entry.section
                )));
            }
            catalogue
                .entries
                .entry((entry.content_type, entry.section))
                .or_default()
                .extend(entry.variants.into_iter().map(|mut v| {
                    v.body = v.body.trim_end().to_string();
                    v
                }));
        }

        let missing: Vec<&str> = REQUIRED_GENERIC_KINDS
            .iter()
            .filter(|kind| !catalogue.entries.contains_key(&(ContentType::Generic, **kind)))
            .map(|kind| kind.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "catalogue has no generic variants for {}",
                missing.join(", ")
            )));
        }
        Ok(catalogue)
    }

    /// Variants for a (type, kind) pair, falling back to the generic set
    pub fn variants(&self, content_type: ContentType, kind: SectionKind) -> &[PatternVariant] {
        self.entries
            .get(&(content_type, kind))
            .or_else(|| self.entries.get(&(ContentType::Generic, kind)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn variant(
        &self,
        content_type: ContentType,
        kind: SectionKind,
        id: &str,
    ) -> Option<&PatternVariant> {
        self.variants(content_type, kind).iter().find(|v| v.id == id)
    }

    /// Rotation category for a (type, kind) pair
    pub fn category(content_type: ContentType, kind: SectionKind) -> String {
        format!("{content_type}:{kind}")
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
