//! Named value sets bound to template variables

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ordered, case-insensitively distinct candidate values for one variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", from = "Vec<String>")]
pub struct ValueSet {
    values: Vec<String>,
}

impl ValueSet {
    /// Trims values, drops empties and case-insensitive duplicates.
    /// The first spelling of a duplicate wins.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for value in values {
            let value: String = value.into();
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen.insert(trimmed.to_lowercase()) {
                kept.push(trimmed.to_string());
            } else {
                debug!("Dropping duplicate value '{}'", trimmed);
            }
        }

        Self { values: kept }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        let needle = value.trim().to_lowercase();
        self.values.iter().any(|v| v.to_lowercase() == needle)
    }
}

impl From<Vec<String>> for ValueSet {
    fn from(values: Vec<String>) -> Self {
        ValueSet::new(values)
    }
}

impl From<ValueSet> for Vec<String> {
    fn from(set: ValueSet) -> Self {
        set.values
    }
}

impl<'a> FromIterator<&'a str> for ValueSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        ValueSet::new(iter)
    }
}

/// Variable name to value set bindings supplied by the caller
pub type ValueSets = HashMap<String, ValueSet>;

/// Convenience for building bindings in code and tests
pub fn value_sets<I, K, V>(entries: I) -> ValueSets
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: IntoIterator,
    V::Item: Into<String>,
{
    entries
        .into_iter()
        .map(|(name, values)| (name.into(), ValueSet::new(values)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_dedup_keeps_first() {
        let set = ValueSet::new(["Austin", " austin ", "Denver", "", "AUSTIN"]);
        assert_eq!(set.values(), &["Austin".to_string(), "Denver".to_string()]);
        assert!(set.contains("DENVER"));
    }

    #[test]
    fn test_serde_as_plain_list() {
        let set: ValueSet = serde_json::from_str(r#"["a", "A", "b"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_value_sets_helper() {
        let sets = value_sets([("city", vec!["Austin", "Denver"])]);
        assert_eq!(sets["city"].get(1), Some("Denver"));
    }
}
