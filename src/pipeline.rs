//! End-to-end page generation
//!
//! validate → plan → (per assignment) enrich → map → assemble. Every stage
//! after planning is a pure function of one assignment, so pages can be built
//! on any number of workers; the optional rotation engine is the only shared
//! state.

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::content::catalogue::{structure_id, SectionKind, SUPPORTING_STRUCTURES};
use crate::content::{DefaultSynthesizer, PageAssembler, PageRecord, PatternCatalogue};
use crate::enrich::{Enricher, KnowledgeBase, TopicType};
use crate::error::{Error, Result};
use crate::plan::{plan_with, Assignment, CombinationPlan};
use crate::rotation::RotationEngine;
use crate::template::validation::validate_template_with;
use crate::template::Template;
use crate::values::ValueSets;

/// Cheap to clone; all heavy state is shared.
#[derive(Clone)]
pub struct PageGenerator {
    config: Arc<GeneratorConfig>,
    enricher: Arc<Enricher>,
    assembler: Arc<PageAssembler>,
    rotation: Option<Arc<RotationEngine>>,
}

impl PageGenerator {
    /// Generator with the built-in knowledge tables and phrasing catalogue
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let enricher = Enricher::builtin(&config)?;
        let assembler = PageAssembler::new(
            Arc::new(PatternCatalogue::builtin()?),
            config.quality.clone(),
        );
        Ok(Self {
            config: Arc::new(config),
            enricher: Arc::new(enricher),
            assembler: Arc::new(assembler),
            rotation: None,
        })
    }

    pub fn with_knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.enricher = Arc::new(Enricher::new(knowledge, &self.config));
        self
    }

    pub fn with_catalogue(mut self, catalogue: PatternCatalogue) -> Self {
        self.assembler = Arc::new(PageAssembler::new(
            Arc::new(catalogue),
            self.config.quality.clone(),
        ));
        self
    }

    pub fn with_defaults(mut self, defaults: Arc<dyn DefaultSynthesizer>) -> Self {
        let assembler = PageAssembler::new(
            Arc::new(self.assembler.catalogue().clone()),
            self.config.quality.clone(),
        )
        .with_defaults(defaults);
        self.assembler = Arc::new(assembler);
        self
    }

    /// Let a rotation engine choose supporting-section structures and track
    /// fragment diversity.
    pub fn with_rotation(mut self, rotation: Arc<RotationEngine>) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub fn rotation(&self) -> Option<&Arc<RotationEngine>> {
        self.rotation.as_ref()
    }

    /// Validate the template and plan its combinations. Nothing is generated
    /// when either step fails.
    pub fn prepare(&self, template: &Template, bindings: &ValueSets) -> Result<CombinationPlan> {
        let warnings = validate_template_with(template, &self.config.seo).into_result()?;
        for warning in &warnings {
            warn!("Template '{}': {}", template.name, warning);
        }
        plan_with(template, bindings, &self.config.scale)
    }

    /// Build the page for one assignment.
    pub fn generate_one(&self, template: &Template, assignment: &Assignment) -> Result<PageRecord> {
        let topic = TopicType::detect(&template.pattern, assignment.keys());
        let enriched = self.enricher.enrich(&topic, assignment);

        let page = match &self.rotation {
            None => self.assembler.assemble_page(template, assignment, &enriched)?,
            Some(rotation) => {
                let content_type = self.assembler.content_type(template, assignment, &enriched);
                let structure = rotated_structure(rotation, &format!("structure:{content_type}"));
                let page = self.assembler.assemble_page_with_structure(
                    template,
                    assignment,
                    &enriched,
                    structure.as_deref(),
                )?;
                for fragment in page.variant_ids() {
                    rotation.record_fragment(fragment);
                }
                page
            }
        };

        debug!(
            slug = %page.slug,
            topic = %topic,
            data_quality = enriched.data_quality,
            "Generated page"
        );
        Ok(page)
    }

    /// Lazily generate pages in enumeration order.
    pub fn generate<'a>(
        &'a self,
        template: &'a Template,
        plan: &'a CombinationPlan,
        limit: Option<u64>,
    ) -> impl Iterator<Item = Result<PageRecord>> + 'a {
        plan.enumerate(limit)
            .map(move |assignment| self.generate_one(template, &assignment))
    }

    /// Validate, plan and generate up to `limit` pages, stopping at the first
    /// error.
    pub fn generate_all(
        &self,
        template: &Template,
        bindings: &ValueSets,
        limit: Option<u64>,
    ) -> Result<Vec<PageRecord>> {
        let plan = self.prepare(template, bindings)?;
        let pages = self.generate(template, &plan, limit).collect::<Result<Vec<_>>>()?;
        info!(
            "Generated {} page(s) for template '{}' ({} planned)",
            pages.len(),
            template.name,
            plan.total()
        );
        Ok(pages)
    }

    /// Generate in bounded batches on blocking workers. At most one batch per
    /// available core is in flight; output keeps enumeration order.
    pub async fn generate_concurrent(
        &self,
        template: &Template,
        plan: &CombinationPlan,
        limit: Option<u64>,
        batch_size: usize,
    ) -> Result<Vec<PageRecord>> {
        let max_in_flight = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let template = Arc::new(template.clone());
        let mut workers: JoinSet<(usize, Result<Vec<PageRecord>>)> = JoinSet::new();
        let mut finished: Vec<Option<Vec<PageRecord>>> = Vec::new();

        for (index, batch) in plan.batches(batch_size, limit).enumerate() {
            if workers.len() >= max_in_flight {
                if let Some(joined) = workers.join_next().await {
                    store_batch(&mut finished, joined)?;
                }
            }
            let generator = self.clone();
            let template = Arc::clone(&template);
            workers.spawn_blocking(move || {
                let pages = batch
                    .iter()
                    .map(|assignment| generator.generate_one(&template, assignment))
                    .collect::<Result<Vec<_>>>();
                (index, pages)
            });
        }

        while let Some(joined) = workers.join_next().await {
            store_batch(&mut finished, joined)?;
        }

        let pages: Vec<PageRecord> = finished.into_iter().flatten().flatten().collect();
        info!(
            "Generated {} page(s) concurrently for template '{}'",
            pages.len(),
            template.name
        );
        Ok(pages)
    }
}

fn store_batch(
    finished: &mut Vec<Option<Vec<PageRecord>>>,
    joined: std::result::Result<(usize, Result<Vec<PageRecord>>), tokio::task::JoinError>,
) -> Result<()> {
    let (index, pages) = joined.map_err(|e| Error::Worker(e.to_string()))?;
    let pages = pages?;
    if finished.len() <= index {
        finished.resize_with(index + 1, || None);
    }
    finished[index] = Some(pages);
    Ok(())
}

fn rotated_structure(rotation: &RotationEngine, category: &str) -> Option<Vec<SectionKind>> {
    let ids: Vec<String> = SUPPORTING_STRUCTURES
        .iter()
        .map(|s| structure_id(s))
        .collect();
    let selection = rotation.select(category, &ids)?;
    SUPPORTING_STRUCTURES.get(selection.index).cloned()
}
