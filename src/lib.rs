//! # Pageforge
//!
//! Expand a handful of parameterized page templates against named value sets
//! into many distinct, SEO-formatted pages without near-duplicate output.
//!
//! ## Usage
//!
//! ```no_run
//! use pageforge::{value_sets, GeneratorConfig, PageGenerator, Template};
//!
//! # fn main() -> pageforge::Result<()> {
//! let template = Template::builder("Best {service} in {city}")
//!     .title("Best {service} in {city}")
//!     .meta_description("Compare {service} providers in {city}: typical costs and how to hire.")
//!     .heading("{service} in {city}")
//!     .url_pattern("/{service}/{city}/")
//!     .build();
//! let bindings = value_sets([
//!     ("service", vec!["Plumbing", "Roofing"]),
//!     ("city", vec!["Austin", "Denver"]),
//! ]);
//!
//! let generator = PageGenerator::new(GeneratorConfig::default())?;
//! for page in generator.generate_all(&template, &bindings, None)? {
//!     println!("{} -> /{}", page.title, page.slug);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - `template` - Template model, placeholder extraction and validation
//! - `values` - Normalised value sets bound to variables
//! - `plan` - Combination planning and lazy enumeration
//! - `enrich` - Knowledge tables, derived facts, business labels and variable mapping
//! - `content` - Content-type detection, phrasing catalogue, deterministic selection and page assembly
//! - `rotation` - Usage-balanced variant rotation with persisted history
//! - `llm` - Text generation collaborator contract and helpers
//! - `pipeline` - End-to-end sequential and concurrent page generation
//! - `config` - Tunable thresholds and weights
//! - `logging` - Tracing subscriber setup for embedding binaries
pub mod config;
pub mod content;
pub mod enrich;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod plan;
pub mod rotation;
pub mod template;
pub mod values;

pub use config::GeneratorConfig;
pub use content::{PageRecord, RenderedSection, SectionKind};
pub use enrich::{EnrichedRecord, Enricher, TopicType};
pub use error::{Error, Result};
pub use pipeline::PageGenerator;
pub use plan::{plan, Assignment, CombinationPlan, ScaleWarning};
pub use rotation::{RotationEngine, RotationStrategy};
pub use template::{validate_template, Template};
pub use values::{value_sets, ValueSet, ValueSets};
