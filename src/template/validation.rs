//! Read-only contract checks run before planning

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::variables::{
    duplicate_variables, extract_variables, is_valid_variable_name, scan_tokens, title_case,
    PLACEHOLDER_REGEX,
};
use super::{Template, TemplateField};
use crate::config::SeoLengths;
use crate::error::{Error, Result};

/// Outcome of validating a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Convert into an `InvalidTemplate` error when any error was found
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.is_valid {
            Ok(self.warnings)
        } else {
            Err(Error::InvalidTemplate {
                errors: self.errors,
            })
        }
    }
}

/// Validate against the default SEO length recommendations
pub fn validate_template(template: &Template) -> ValidationReport {
    validate_template_with(template, &SeoLengths::default())
}

pub fn validate_template_with(template: &Template, seo: &SeoLengths) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if template.pattern.trim().is_empty() {
        errors.push("Template pattern is empty".to_string());
    } else if template.required.is_empty() && extract_variables(&template.pattern).is_empty() {
        errors.push("No variables found in template pattern".to_string());
    }

    for name in template.required.iter().chain(template.optional.iter()) {
        if !is_valid_variable_name(name) {
            errors.push(format!("Invalid declared variable name '{name}'"));
        }
    }

    let declared: HashSet<String> = template.declared_variables().into_iter().collect();

    for (field, text) in template.fields() {
        for token in scan_tokens(text) {
            if !is_valid_variable_name(&token.name) {
                errors.push(format!(
                    "Invalid variable name '{}' in {}",
                    token.name, field
                ));
            }
        }

        let duplicates = duplicate_variables(text);
        match field {
            TemplateField::SectionHeading(_) | TemplateField::SectionBody(_) => {
                for name in duplicates {
                    warnings.push(format!("Variable '{name}' repeats in {field}"));
                }
            }
            _ => {
                for name in duplicates {
                    errors.push(format!("Duplicate variable '{name}' in {field}"));
                }
            }
        }

        for name in extract_variables(text) {
            if !declared.contains(&name) {
                errors.push(format!("Undeclared variable '{name}' in {field}"));
            }
        }
    }

    let seo_fields = [
        (TemplateField::Title, &template.title_template, "the pattern"),
        (
            TemplateField::MetaDescription,
            &template.meta_description_template,
            "an excerpt of the introduction",
        ),
        (TemplateField::Heading, &template.heading_template, "the pattern"),
        (TemplateField::UrlPattern, &template.url_pattern, "the slugified title"),
    ];
    for (field, text, fallback) in seo_fields {
        if text.trim().is_empty() {
            warnings.push(format!("Missing SEO field {field}; using {fallback}"));
        }
    }

    if !template.title_template.trim().is_empty() {
        let title_len = sample_fill(&template.title_template).chars().count();
        if title_len > seo.title_max {
            warnings.push(format!(
                "Sample title is {title_len} characters; recommended maximum is {}",
                seo.title_max
            ));
        } else if title_len < seo.title_min {
            warnings.push(format!(
                "Sample title is {title_len} characters; recommended minimum is {}",
                seo.title_min
            ));
        }
    }

    if !template.meta_description_template.trim().is_empty() {
        let meta_len = sample_fill(&template.meta_description_template)
            .chars()
            .count();
        if meta_len > seo.meta_max {
            warnings.push(format!(
                "Sample meta description is {meta_len} characters; recommended maximum is {}",
                seo.meta_max
            ));
        } else if meta_len < seo.meta_min {
            warnings.push(format!(
                "Sample meta description is {meta_len} characters; recommended minimum is {}",
                seo.meta_min
            ));
        }
    }

    debug!(
        template = %template.name,
        errors = errors.len(),
        warnings = warnings.len(),
        "Validated template"
    );

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Fill placeholders with a title-cased rendering of their own name
pub fn sample_fill(text: &str) -> String {
    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            title_case(name)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_template() -> Template {
        Template::builder("Best {service} in {city}")
            .title("Best {service} Companies in {city} This Year")
            .meta_description(
                "Looking for {service} in {city}? Compare local providers, typical prices, \
                 availability and reviews before you hire anyone this season.",
            )
            .heading("{service} in {city}")
            .url_pattern("/{service}-in-{city}")
            .build()
    }

    #[test]
    fn test_valid_template_has_no_errors() {
        let report = validate_template(&valid_template());
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_empty_pattern() {
        let mut template = valid_template();
        template.pattern = "  ".into();
        let report = validate_template(&template);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("empty")));
    }

    #[test]
    fn test_pattern_without_variables() {
        let mut template = valid_template();
        template.pattern = "Static page".into();
        let report = validate_template(&template);
        assert!(report
            .errors
            .iter()
            .any(|e| e == "No variables found in template pattern"));
    }

    #[test]
    fn test_invalid_name_and_duplicate() {
        let mut template = valid_template();
        template.title_template = "{city} {city} {2fast}".into();
        let report = validate_template(&template);
        assert!(report
            .errors
            .iter()
            .any(|e| e == "Duplicate variable 'city' in title_template"));
        assert!(report
            .errors
            .iter()
            .any(|e| e == "Invalid variable name '2fast' in title_template"));
    }

    #[test]
    fn test_repeats_in_sections_only_warn() {
        let template = Template::builder("{city}")
            .title("Living in {city}: A Complete Local Guide")
            .meta_description("m {city}")
            .heading("{city}")
            .url_pattern("/{city}")
            .section("About", "{city} is great. Visit {city}.")
            .build();
        let report = validate_template(&template);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.warnings.iter().any(|w| w.contains("repeats")));
    }

    #[test]
    fn test_missing_seo_fields_only_warn() {
        let template = Template::builder("Best {service} in {city}").build();
        let report = validate_template(&template);
        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(
            report
                .warnings
                .iter()
                .filter(|w| w.starts_with("Missing SEO field"))
                .count(),
            4
        );
        assert!(report
            .warnings
            .contains(&"Missing SEO field title_template; using the pattern".to_string()));
    }

    #[test]
    fn test_undeclared_variable_is_error() {
        let mut template = valid_template();
        template.heading_template = "{service} near {landmark}".into();
        let report = validate_template(&template);
        assert!(report
            .errors
            .iter()
            .any(|e| e == "Undeclared variable 'landmark' in heading_template"));
    }

    #[test]
    fn test_length_warnings() {
        let mut template = valid_template();
        template.title_template = "{service}".into();
        template.meta_description_template = "{city}".into();
        let report = validate_template(&template);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_into_result() {
        let template = Template::builder("").build();
        let err = validate_template(&template).into_result().unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
    }

    #[test]
    fn test_sample_fill() {
        assert_eq!(sample_fill("Best {service} in [city]"), "Best Service in City");
    }
}
