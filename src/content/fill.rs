//! Placeholder substitution

use std::collections::BTreeMap;

use tracing::trace;

use super::catalogue::PatternVariant;
use super::defaults::DefaultSynthesizer;
use crate::template::variables::{extract_variables, PLACEHOLDER_REGEX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledVariant {
    pub heading: String,
    pub body: String,
    /// Names neither the data nor the synthesizer could supply
    pub unresolved: Vec<String>,
}

/// Text after one fill pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledText {
    pub text: String,
    pub unresolved: Vec<String>,
}

/// Replace every `{name}` / `[name]` token in a single pass.
///
/// Names missing from `data` are synthesized from the name itself. Substituted
/// values are not rescanned, so braces or brackets inside a value are kept as
/// written. A name the synthesizer returns nothing for keeps its token and is
/// reported in `unresolved`.
pub fn fill_text_checked(
    text: &str,
    data: &BTreeMap<String, String>,
    defaults: &dyn DefaultSynthesizer,
) -> FilledText {
    let mut unresolved: Vec<String> = Vec::new();
    let text = PLACEHOLDER_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if let Some(value) = data.get(name) {
                return value.clone();
            }
            let value = defaults.synthesize(name);
            if value.trim().is_empty() {
                if !unresolved.iter().any(|n| n == name) {
                    unresolved.push(name.to_string());
                }
                return caps[0].to_string();
            }
            trace!("Synthesized default for '{}': {}", name, value);
            value
        })
        .into_owned();
    FilledText { text, unresolved }
}

/// [`fill_text_checked`] without the report
pub fn fill_text(
    text: &str,
    data: &BTreeMap<String, String>,
    defaults: &dyn DefaultSynthesizer,
) -> String {
    fill_text_checked(text, data, defaults).text
}

pub fn fill_pattern(
    variant: &PatternVariant,
    data: &BTreeMap<String, String>,
    defaults: &dyn DefaultSynthesizer,
) -> FilledVariant {
    let heading = fill_text_checked(&variant.heading, data, defaults);
    let body = fill_text_checked(&variant.body, data, defaults);
    let mut unresolved = heading.unresolved;
    for name in body.unresolved {
        if !unresolved.contains(&name) {
            unresolved.push(name);
        }
    }
    FilledVariant {
        heading: heading.text,
        body: body.text,
        unresolved,
    }
}

/// Placeholder tokens still present in rendered text
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    extract_variables(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::defaults::{HashedDefaults, SeededDefaults};

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_both_syntaxes_are_filled() {
        let out = fill_text(
            "Best {service} in [city]",
            &data(&[("service", "Plumbing"), ("city", "Austin")]),
            &HashedDefaults,
        );
        assert_eq!(out, "Best Plumbing in Austin");
    }

    #[test]
    fn test_missing_names_get_defaults() {
        let out = fill_text("Costs {average_price} for {guest_count} guests", &data(&[]), &HashedDefaults);
        assert!(unresolved_placeholders(&out).is_empty());
        assert!(out.contains('$'));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let out = fill_text("{a}", &data(&[("a", "{b}")]), &HashedDefaults);
        assert_eq!(out, "{b}");
        assert_eq!(unresolved_placeholders(&out), vec!["b"]);
    }

    struct NoDefaults;

    impl DefaultSynthesizer for NoDefaults {
        fn synthesize(&self, _name: &str) -> String {
            String::new()
        }
    }

    #[test]
    fn test_bracketed_values_are_not_reported() {
        let filled = fill_text_checked(
            "Best {service} near [city]",
            &data(&[("service", "Roofing [Commercial]"), ("city", "{Downtown}")]),
            &HashedDefaults,
        );
        assert_eq!(filled.text, "Best Roofing [Commercial] near {Downtown}");
        assert!(filled.unresolved.is_empty());
    }

    #[test]
    fn test_unsynthesized_names_are_reported() {
        let filled = fill_text_checked("{known} and {mystery} and [mystery]", &data(&[("known", "ok")]), &NoDefaults);
        assert_eq!(filled.text, "ok and {mystery} and [mystery]");
        assert_eq!(filled.unresolved, vec!["mystery"]);
    }

    #[test]
    fn test_markdown_is_left_alone() {
        let text = "| Detail | Value |\n|---|---|\n**Q?** {answer}";
        let out = fill_text(text, &data(&[("answer", "Yes")]), &SeededDefaults::new(1));
        assert_eq!(out, "| Detail | Value |\n|---|---|\n**Q?** Yes");
    }

    #[test]
    fn test_fill_pattern_fills_heading_and_body() {
        let variant = PatternVariant {
            id: "v".into(),
            heading: "{subject} in {location}".into(),
            body: "About [subject].".into(),
        };
        let filled = fill_pattern(
            &variant,
            &data(&[("subject", "Roofing"), ("location", "Denver")]),
            &HashedDefaults,
        );
        assert_eq!(filled.heading, "Roofing in Denver");
        assert_eq!(filled.body, "About Roofing.");
        assert!(filled.unresolved.is_empty());
    }
}
