//! Page assembly
//!
//! Renders the SEO fields and an ordered list of sections for one
//! assignment: introduction, main value, template-declared sections, two or
//! three supporting sections and a call to action.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::catalogue::{PatternCatalogue, SectionKind, SUPPORTING_STRUCTURES};
use super::content_type::{detect_content_type, ContentType};
use super::defaults::{DefaultSynthesizer, HashedDefaults};
use super::fill::{fill_pattern, fill_text_checked};
use super::page::{excerpt, slugify, slugify_path, word_count, PageRecord, RenderedSection};
use super::selector::{canonical_serialization, select_pattern, stable_hash};
use crate::config::QualityWeights;
use crate::enrich::mapping::{transform_with, VariableMap};
use crate::enrich::EnrichedRecord;
use crate::error::{Error, Result};
use crate::plan::Assignment;
use crate::template::Template;

/// Length of the introduction excerpt used when a template has no meta description
const META_EXCERPT_CHARS: usize = 155;

pub struct PageAssembler {
    catalogue: Arc<PatternCatalogue>,
    quality: QualityWeights,
    defaults: Arc<dyn DefaultSynthesizer>,
}

impl PageAssembler {
    pub fn new(catalogue: Arc<PatternCatalogue>, quality: QualityWeights) -> Self {
        Self {
            catalogue,
            quality,
            defaults: Arc::new(HashedDefaults),
        }
    }

    pub fn with_defaults(mut self, defaults: Arc<dyn DefaultSynthesizer>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn catalogue(&self) -> &PatternCatalogue {
        &self.catalogue
    }

    /// Content type for a template and the data bound to it
    pub fn content_type(
        &self,
        template: &Template,
        data: &Assignment,
        enriched: &EnrichedRecord,
    ) -> ContentType {
        detect_content_type(
            &template.pattern,
            data.keys().chain(enriched.primary_data.keys()),
        )
    }

    /// Assemble with the supporting structure chosen from the input hash.
    pub fn assemble_page(
        &self,
        template: &Template,
        data: &Assignment,
        enriched: &EnrichedRecord,
    ) -> Result<PageRecord> {
        self.assemble_page_with_structure(template, data, enriched, None)
    }

    /// Assemble with an explicit supporting-section order, typically chosen
    /// by a rotation engine.
    pub fn assemble_page_with_structure(
        &self,
        template: &Template,
        data: &Assignment,
        enriched: &EnrichedRecord,
        structure: Option<&[SectionKind]>,
    ) -> Result<PageRecord> {
        let content_type = self.content_type(template, data, enriched);
        let required = template.all_placeholders();
        let mapped = transform_with(enriched, data, &required, self.defaults.as_ref());
        let mut unresolved = Vec::new();
        let mut fill = |text: &str| self.fill_into(text, &mapped, &mut unresolved);

        let title = fill(non_empty_or(&template.title_template, &template.pattern));
        let heading = fill(non_empty_or(&template.heading_template, &template.pattern));
        let meta_template = fill(&template.meta_description_template);
        let url = fill(&template.url_pattern);
        let custom: Vec<(String, String)> = template
            .content_sections
            .iter()
            .map(|section| (fill(&section.heading), fill(&section.body)))
            .collect();

        let supporting = match structure {
            Some(kinds) => kinds.to_vec(),
            None => default_structure(content_type, data),
        };

        let mut sections = Vec::new();
        for kind in [SectionKind::Introduction, SectionKind::MainValue] {
            sections.extend(self.render_section(kind, content_type, data, &mapped, &mut unresolved));
        }
        for (i, (heading, body)) in custom.into_iter().enumerate() {
            sections.push(RenderedSection::new(
                SectionKind::Custom,
                heading,
                body,
                format!("template:{i}"),
            ));
        }
        for kind in supporting.iter().filter(|k| k.is_supporting()) {
            sections.extend(self.render_section(*kind, content_type, data, &mapped, &mut unresolved));
        }
        sections.extend(self.render_section(
            SectionKind::CallToAction,
            content_type,
            data,
            &mapped,
            &mut unresolved,
        ));

        if !unresolved.is_empty() {
            return Err(Error::UnresolvedPlaceholder {
                placeholders: unresolved,
            });
        }

        let meta_description = if meta_template.trim().is_empty() {
            sections
                .first()
                .map(|intro| excerpt(&intro.body, META_EXCERPT_CHARS))
                .unwrap_or_default()
        } else {
            meta_template
        };
        let slug = match slugify_path(&url) {
            s if s.is_empty() => slugify(&title),
            s => s,
        };
        let content = render_content(&heading, &sections);

        let word_count = word_count(&content);
        let quality_score = quality_score(&self.quality, word_count, &sections);

        debug!(
            slug = %slug,
            content_type = %content_type,
            sections = sections.len(),
            word_count,
            quality_score,
            "Assembled page"
        );

        Ok(PageRecord {
            title,
            slug,
            heading,
            meta_description,
            sections,
            content,
            word_count,
            quality_score,
            variables: data.clone(),
            content_type,
            data_quality: enriched.data_quality,
            generated_at: Utc::now(),
        })
    }

    /// Fill `text`, recording any placeholder that neither the data nor
    /// the default synthesizer could resolve.
    fn fill_into(&self, text: &str, mapped: &VariableMap, unresolved: &mut Vec<String>) -> String {
        let filled = fill_text_checked(text, mapped, self.defaults.as_ref());
        merge_names(unresolved, filled.unresolved);
        filled.text
    }

    fn render_section(
        &self,
        kind: SectionKind,
        content_type: ContentType,
        data: &Assignment,
        mapped: &VariableMap,
        unresolved: &mut Vec<String>,
    ) -> Option<RenderedSection> {
        let variant = select_pattern(&self.catalogue, kind, content_type, data)?;
        let filled = fill_pattern(variant, mapped, self.defaults.as_ref());
        merge_names(unresolved, filled.unresolved);
        Some(RenderedSection::new(
            kind,
            filled.heading,
            filled.body,
            variant.id.clone(),
        ))
    }
}

fn merge_names(into: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !into.contains(&name) {
            into.push(name);
        }
    }
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}

/// Supporting structure picked by hashing the input, like phrasing variants
pub fn default_structure(content_type: ContentType, data: &Assignment) -> Vec<SectionKind> {
    let key = format!("structure|{content_type}|{}", canonical_serialization(data));
    let index = (stable_hash(&key) % SUPPORTING_STRUCTURES.len() as u64) as usize;
    SUPPORTING_STRUCTURES[index].clone()
}

fn render_content(heading: &str, sections: &[RenderedSection]) -> String {
    let mut parts = vec![format!("# {heading}")];
    for section in sections {
        parts.push(format!("## {}\n\n{}", section.heading, section.body));
    }
    parts.join("\n\n")
}

/// Base score plus word-count, data-richness and section-variety bonuses,
/// capped at 100.
pub fn quality_score(weights: &QualityWeights, word_count: usize, sections: &[RenderedSection]) -> u32 {
    let words: u32 = weights
        .word_bonuses
        .iter()
        .filter(|b| word_count >= b.min_words)
        .map(|b| b.bonus)
        .sum();

    let data_rich = sections.iter().filter(|s| s.data_rich).count() as u32;
    let data_rich = (data_rich * weights.data_rich_bonus).min(weights.data_rich_cap);

    let kinds: HashSet<SectionKind> = sections.iter().map(|s| s.kind).collect();
    let diversity = (kinds.len() as u32 * weights.diversity_bonus).min(weights.diversity_cap);

    (weights.base + words + data_rich + diversity).min(100)
}
