//! Placeholder extraction
//!
//! Placeholders use either `{name}` or `[name]` syntax, interchangeably.
//! Names must match `^[A-Za-z][A-Za-z0-9_]*$`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Matches a well-formed placeholder in either syntax
pub(crate) static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}|\[([A-Za-z][A-Za-z0-9_]*)\]")
        .expect("Valid regex pattern")
});

/// Matches anything that looks like a brace placeholder, well-formed or not
static LOOSE_BRACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}\s]*)\}").expect("Valid regex pattern"));

/// Bracket tokens are only treated as placeholders when they start like a name,
/// so footnotes such as `[1]` are left alone.
static LOOSE_BRACKET_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z_][^\[\]\s]*)\]").expect("Valid regex pattern"));

static VARIABLE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("Valid regex pattern"));

/// A placeholder occurrence found in a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// Unique placeholder names in first-seen order
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    placeholder_names(text)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Every well-formed placeholder occurrence, duplicates included
pub fn placeholder_names(text: &str) -> impl Iterator<Item = String> + '_ {
    PLACEHOLDER_REGEX.captures_iter(text).filter_map(|cap| {
        cap.get(1)
            .or_else(|| cap.get(2))
            .map(|m| m.as_str().to_string())
    })
}

/// Raw placeholder-like tokens, including malformed names such as `{1st}`
pub fn scan_tokens(text: &str) -> Vec<PlaceholderToken> {
    let mut tokens: Vec<PlaceholderToken> = LOOSE_BRACE_REGEX
        .captures_iter(text)
        .chain(LOOSE_BRACKET_REGEX.captures_iter(text))
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(1)?;
            Some(PlaceholderToken {
                name: name.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect();
    tokens.sort_by_key(|t| t.start);
    tokens
}

pub fn is_valid_variable_name(name: &str) -> bool {
    VARIABLE_NAME_REGEX.is_match(name)
}

/// Names that occur more than once in the same text, in first-repeat order
pub fn duplicate_variables(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for name in placeholder_names(text) {
        if !seen.insert(name.clone()) && reported.insert(name.clone()) {
            duplicates.push(name);
        }
    }

    duplicates
}

/// "property_type" -> "property type"
pub fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// "property_type" -> "Property Type"
pub fn title_case(name: &str) -> String {
    humanize(name)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
