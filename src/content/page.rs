//! Assembled page value objects

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::catalogue::SectionKind;
use super::content_type::ContentType;
use crate::plan::Assignment;

static TABLE_DIVIDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\|[-:| ]+\|\s*$").expect("Valid regex pattern"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:[-*+]|\d+\.)\s+\S").expect("Valid regex pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSection {
    pub kind: SectionKind,
    pub heading: String,
    pub body: String,
    /// Catalogue variant id, or `template:<index>` for template sections
    pub variant_id: String,
    pub data_rich: bool,
}

impl RenderedSection {
    pub fn new(kind: SectionKind, heading: String, body: String, variant_id: String) -> Self {
        let data_rich = is_data_rich(&body);
        Self {
            kind,
            heading,
            body,
            variant_id,
            data_rich,
        }
    }
}

/// One generated page. Built once by the assembler and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub title: String,
    pub slug: String,
    pub heading: String,
    pub meta_description: String,
    pub sections: Vec<RenderedSection>,
    pub content: String,
    pub word_count: usize,
    pub quality_score: u32,
    pub variables: Assignment,
    pub content_type: ContentType,
    pub data_quality: f64,
    pub generated_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn section(&self, kind: SectionKind) -> Option<&RenderedSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Variant ids in section order, used as diversity fragments
    pub fn variant_ids(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.variant_id.as_str())
    }
}

/// Tables and lists count as data-rich blocks
pub fn is_data_rich(body: &str) -> bool {
    TABLE_DIVIDER.is_match(body) || LIST_ITEM.is_match(body)
}

/// Tokens containing at least one alphanumeric character
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count()
}

/// Lowercase alphanumerics separated by single hyphens. Latin accents are
/// folded (`São Paulo` gives `sao-paulo`), apostrophes vanish rather than
/// splitting a word, and letters with no ASCII form are kept as they are.
pub fn slugify(segment: &str) -> String {
    let mut slug = String::with_capacity(segment.len());
    let mut pending_dash = false;
    for c in segment.nfkd().flat_map(char::to_lowercase) {
        if is_combining_mark(c) || APOSTROPHES.contains(&c) {
            continue;
        }
        let mut buf = [0u8; 4];
        let piece: &str = match fold_letter(c) {
            Some(folded) => folded,
            None if c.is_alphanumeric() => &*c.encode_utf8(&mut buf),
            None => {
                pending_dash = true;
                continue;
            }
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push_str(piece);
    }
    slug
}

const APOSTROPHES: [char; 7] = ['\'', '\u{2019}', '\u{2018}', '`', '"', '\u{201c}', '\u{201d}'];

/// Latin letters that do not decompose into a base letter plus marks
fn fold_letter(c: char) -> Option<&'static str> {
    Some(match c {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'þ' => "th",
        'ð' | 'đ' => "d",
        'ł' => "l",
        'ı' => "i",
        _ => return None,
    })
}

/// First sentences of `text` up to `max_chars`, cut at a word boundary
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('|') && !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }

    let mut cut = String::new();
    for word in flat.split_whitespace() {
        let extra = if cut.is_empty() { 0 } else { 1 };
        if cut.chars().count() + extra + word.chars().count() > max_chars.saturating_sub(3) {
            break;
        }
        if extra == 1 {
            cut.push(' ');
        }
        cut.push_str(word);
    }
    let cut = cut.trim_end_matches(|c: char| c.is_ascii_punctuation());
    format!("{cut}...")
}

/// Slugify each `/`-separated segment of a filled URL pattern, dropping
/// empty segments so leading and trailing slashes disappear.
pub fn slugify_path(path: &str) -> String {
    path.split('/')
        .map(slugify)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Best Plumbing in Austin!"), "best-plumbing-in-austin");
        assert_eq!(slugify("  --San   Diego--  "), "san-diego");
        assert_eq!(slugify("Café"), "cafe");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_slugify_folds_accents_and_apostrophes() {
        assert_eq!(slugify("São Paulo"), "sao-paulo");
        assert_eq!(slugify("Zürich"), "zurich");
        assert_eq!(slugify("Joe's Plumbing"), "joes-plumbing");
        assert_eq!(slugify("Joe\u{2019}s Plumbing"), "joes-plumbing");
        assert_eq!(slugify("Straße"), "strasse");
        assert_eq!(slugify("Łódź"), "lodz");
        assert_eq!(slugify("東京"), "東京");
        assert_eq!(slugify("東京 Tower"), "東京-tower");
    }

    #[test]
    fn test_excerpt_cuts_at_word_boundary() {
        let text = "Plumbing in Austin is in steady demand. Typical jobs run a few hundred dollars.";
        assert_eq!(excerpt(text, 200), text);

        let short = excerpt(text, 30);
        assert!(short.ends_with("..."));
        assert!(short.chars().count() <= 30);
        assert_eq!(short, "Plumbing in Austin is in...");
        assert_eq!(excerpt("| a | b |\n|---|---|\nPlain line", 50), "Plain line");
    }

    #[test]
    fn test_slugify_path() {
        assert_eq!(
            slugify_path("/Plumbing/Austin, TX/"),
            "plumbing/austin-tx"
        );
        assert_eq!(slugify_path("airbnb-Denver"), "airbnb-denver");
        assert_eq!(slugify_path("//"), "");
    }

    #[test]
    fn test_word_count_ignores_markup_tokens() {
        assert_eq!(word_count("# Title\n\n| a | b |\n|---|---|\n- one two"), 5);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_data_rich_detection() {
        assert!(is_data_rich("| Detail | Value |\n|---|---|\n| Rate | $1 |"));
        assert!(is_data_rich("Intro\n\n- Rate: $1\n- Occupancy: 60%"));
        assert!(is_data_rich("1. First step"));
        assert!(!is_data_rich("Plain prose with a - dash in it."));
        assert!(!is_data_rich("**Is it worth it?** Yes."));
    }
}
