//! Content-type classification
//!
//! A priority-ordered keyword classifier over the template pattern and the
//! available data keys. Precedence: question-like phrasing, comparison
//! markers, educational markers, product markers, location plus service
//! co-occurrence, then the generic fallback.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Evaluation,
    Comparison,
    Educational,
    Product,
    LocationService,
    Generic,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::Evaluation,
        ContentType::Comparison,
        ContentType::Educational,
        ContentType::Product,
        ContentType::LocationService,
        ContentType::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Evaluation => "evaluation",
            ContentType::Comparison => "comparison",
            ContentType::Educational => "educational",
            ContentType::Product => "product",
            ContentType::LocationService => "location_service",
            ContentType::Generic => "generic",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const QUESTION_OPENERS: &[&str] = &[
    "is ", "are ", "should ", "can ", "does ", "do ", "will ", "would ", "what ", "which ",
];
const QUESTION_MARKERS: &[&str] = &["worth it", "pros and cons"];
const COMPARISON_MARKERS: &[&str] = &[
    " vs ", " vs. ", "versus", "compare", "comparison", "alternative", "better than",
];
const EDUCATIONAL_MARKERS: &[&str] = &[
    "how to", "guide", "tutorial", "learn", "tips", "explained", "beginner", "step by step",
];
const PRODUCT_MARKERS: &[&str] = &[
    "review", "buy", "product", "price of", "deal", "discount", "brand", "model",
];
const LOCATION_MARKERS: &[&str] = &[
    "city", "location", " near ", "area", "state", "town", "region", " in {", " in [",
];
const SERVICE_MARKERS: &[&str] = &[
    "service",
    "provider",
    "company",
    "companies",
    "contractor",
    "repair",
    "installation",
    "cleaning",
    "plumb",
    "agency",
];

/// Classify a template by its pattern text and the variable names it can use
pub fn detect_content_type<I, S>(pattern: &str, data_keys: I) -> ContentType
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let text = pattern.to_lowercase();
    let keys: Vec<String> = data_keys
        .into_iter()
        .map(|k| k.as_ref().to_lowercase())
        .collect();
    let padded = format!(" {} ", text);
    let any = |markers: &[&str]| markers.iter().any(|m| padded.contains(m));
    let any_key = |markers: &[&str]| {
        keys.iter()
            .any(|k| markers.iter().any(|m| k.contains(m.trim())))
    };

    let trimmed = text.trim_start();
    if text.contains('?')
        || QUESTION_OPENERS.iter().any(|q| trimmed.starts_with(q))
        || any(QUESTION_MARKERS)
    {
        ContentType::Evaluation
    } else if any(COMPARISON_MARKERS) {
        ContentType::Comparison
    } else if any(EDUCATIONAL_MARKERS) {
        ContentType::Educational
    } else if any(PRODUCT_MARKERS) {
        ContentType::Product
    } else if (any(LOCATION_MARKERS) || any_key(LOCATION_MARKERS))
        && (any(SERVICE_MARKERS) || any_key(SERVICE_MARKERS))
    {
        ContentType::LocationService
    } else {
        ContentType::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(pattern: &str, keys: &[&str]) -> ContentType {
        detect_content_type(pattern, keys.iter())
    }

    #[test]
    fn test_question_first() {
        assert_eq!(
            detect("Is Airbnb profitable in {city}?", &["city"]),
            ContentType::Evaluation
        );
        assert_eq!(
            detect("Should you compare {a} vs {b}", &[]),
            ContentType::Evaluation
        );
    }

    #[test]
    fn test_comparison_before_educational() {
        assert_eq!(
            detect("{a} vs {b}: a beginner guide", &[]),
            ContentType::Comparison
        );
    }

    #[test]
    fn test_educational_before_product() {
        assert_eq!(
            detect("How to review {product} deals", &["product"]),
            ContentType::Educational
        );
    }

    #[test]
    fn test_product() {
        assert_eq!(
            detect("{brand} {model} review", &["brand", "model"]),
            ContentType::Product
        );
    }

    #[test]
    fn test_location_service_from_keys() {
        assert_eq!(
            detect("Best {service} in {city}", &["service", "city"]),
            ContentType::LocationService
        );
        assert_eq!(
            detect("Top {trade} pros {where}", &["trade", "city", "provider_count"]),
            ContentType::LocationService
        );
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(detect("{topic} ideas", &["topic"]), ContentType::Generic);
    }
}
