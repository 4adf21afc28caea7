//! Phrasing selection and page assembly
//!
//! Every section of a page is rendered from a catalogue variant chosen by a
//! stable hash of the input, so identical inputs always render identically
//! while different inputs spread across the catalogue.

pub mod assembler;
pub mod catalogue;
pub mod content_type;
pub mod defaults;
pub mod fill;
pub mod page;
pub mod selector;

pub use assembler::PageAssembler;
pub use catalogue::{PatternCatalogue, PatternVariant, SectionKind, SUPPORTING_STRUCTURES};
pub use content_type::{detect_content_type, ContentType};
pub use defaults::{DefaultSynthesizer, HashedDefaults, RandomDefaults, SeededDefaults};
pub use fill::{fill_pattern, fill_text, fill_text_checked, unresolved_placeholders, FilledText};
pub use page::{PageRecord, RenderedSection};
pub use selector::select_pattern;
