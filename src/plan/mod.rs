//! Combination planning
//!
//! A [`CombinationPlan`] is the read-only product view over a template's
//! variables and the value sets bound to them. It is cheap to build and never
//! materializes the product; see [`enumerate`](CombinationPlan::enumerate).

pub mod enumerate;

pub use enumerate::{Batches, Combinations};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::config::ScaleThresholds;
use crate::error::{Error, Result};
use crate::template::Template;
use crate::values::ValueSets;

/// One concrete binding of every planned variable
pub type Assignment = BTreeMap<String, String>;

/// Advisory cardinality warnings; the plan is still usable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleWarning {
    TooSmall { total: u64, minimum: u64 },
    Large { total: u64, threshold: u64 },
    VeryLarge { total: u64, threshold: u64 },
    /// The product does not fit in 64 bits
    Overflow,
}

impl fmt::Display for ScaleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleWarning::TooSmall { total, minimum } => write!(
                f,
                "Only {total} combinations; consider adding values (recommended at least {minimum})"
            ),
            ScaleWarning::Large { total, threshold } => write!(
                f,
                "{total} combinations exceeds {threshold}; generate in batches"
            ),
            ScaleWarning::VeryLarge { total, threshold } => write!(
                f,
                "{total} combinations exceeds {threshold}; output is likely to contain thin or near-duplicate pages"
            ),
            ScaleWarning::Overflow => write!(f, "Combination count overflows 64 bits"),
        }
    }
}

/// A variable participating in the product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedVariable {
    pub name: String,
    pub values: Vec<String>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationPlan {
    variables: Vec<PlannedVariable>,
    total: u64,
    warnings: Vec<ScaleWarning>,
}

impl CombinationPlan {
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn warnings(&self) -> &[ScaleWarning] {
        &self.warnings
    }

    pub fn variables(&self) -> &[PlannedVariable] {
        &self.variables
    }

    /// Declared order: required variables first, then bound optional ones
    pub fn variable_order(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn per_variable(&self) -> BTreeMap<String, usize> {
        self.variables
            .iter()
            .map(|v| (v.name.clone(), v.values.len()))
            .collect()
    }

    /// Lazily enumerate assignments in declared order, optionally capped
    pub fn enumerate(&self, limit: Option<u64>) -> Combinations<'_> {
        self.enumerate_from(0, limit)
    }

    /// Resume enumeration at `offset`
    pub fn enumerate_from(&self, offset: u64, limit: Option<u64>) -> Combinations<'_> {
        Combinations::new(self, offset, limit)
    }

    /// Bounded batches over the whole plan
    pub fn batches(&self, batch_size: usize, limit: Option<u64>) -> Batches<'_> {
        Batches::new(self.enumerate(limit), batch_size)
    }

    /// Decode the assignment at a given position of the enumeration order.
    /// The last variable varies fastest.
    pub fn nth(&self, index: u64) -> Option<Assignment> {
        if index >= self.total {
            return None;
        }

        let mut remaining = index;
        let mut assignment = Assignment::new();
        for variable in self.variables.iter().rev() {
            let radix = variable.values.len() as u64;
            let position = (remaining % radix) as usize;
            remaining /= radix;
            assignment.insert(variable.name.clone(), variable.values[position].clone());
        }
        Some(assignment)
    }
}

/// Plan with the default scale thresholds
pub fn plan(template: &Template, bindings: &ValueSets) -> Result<CombinationPlan> {
    plan_with(template, bindings, &ScaleThresholds::default())
}

pub fn plan_with(
    template: &Template,
    bindings: &ValueSets,
    thresholds: &ScaleThresholds,
) -> Result<CombinationPlan> {
    let required = template.required_variables();
    if required.is_empty() {
        return Err(Error::invalid_template(
            "Template declares no required variables",
        ));
    }

    let bound = |name: &str| bindings.get(name).filter(|set| !set.is_empty());

    let missing: Vec<String> = required
        .iter()
        .filter(|name| bound(name).is_none())
        .cloned()
        .collect();

    if !missing.is_empty() {
        let mut available: Vec<String> = bindings
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        available.sort();
        warn!(
            "Cannot plan template '{}': missing {:?}",
            template.name, missing
        );
        return Err(Error::MissingData { missing, available });
    }

    let mut variables = Vec::new();
    for name in &required {
        if let Some(set) = bound(name) {
            variables.push(PlannedVariable {
                name: name.clone(),
                values: set.values().to_vec(),
                optional: false,
            });
        }
    }
    for name in template.optional_variables() {
        if let Some(set) = bound(&name) {
            variables.push(PlannedVariable {
                name,
                values: set.values().to_vec(),
                optional: true,
            });
        }
    }

    let product = variables
        .iter()
        .try_fold(1u64, |acc, v| acc.checked_mul(v.values.len() as u64));

    let mut warnings = Vec::new();
    let total = match product {
        Some(total) => {
            if total > thresholds.very_large {
                warnings.push(ScaleWarning::VeryLarge {
                    total,
                    threshold: thresholds.very_large,
                });
            } else if total > thresholds.large {
                warnings.push(ScaleWarning::Large {
                    total,
                    threshold: thresholds.large,
                });
            }
            if total < thresholds.small {
                warnings.push(ScaleWarning::TooSmall {
                    total,
                    minimum: thresholds.small,
                });
            }
            total
        }
        None => {
            warnings.push(ScaleWarning::Overflow);
            u64::MAX
        }
    };

    for warning in &warnings {
        warn!("{}", warning);
    }
    info!(
        "Planned {} combinations over {} variables for template '{}'",
        total,
        variables.len(),
        template.name
    );

    Ok(CombinationPlan {
        variables,
        total,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{value_sets, ValueSet};

    fn template() -> Template {
        Template::builder("Best {service} in {city}")
            .optional(["state"])
            .build()
    }

    #[test]
    fn test_total_is_product() {
        let bindings = value_sets([
            ("service", vec!["Plumbing", "Roofing"]),
            ("city", vec!["Austin", "Denver"]),
        ]);
        let plan = plan(&template(), &bindings).unwrap();
        assert_eq!(plan.total(), 4);
        assert_eq!(plan.variable_order(), vec!["service", "city"]);
        assert!(matches!(
            plan.warnings(),
            [ScaleWarning::TooSmall { total: 4, .. }]
        ));
    }

    #[test]
    fn test_bound_optional_multiplies() {
        let bindings = value_sets([
            ("service", vec!["Plumbing", "Roofing"]),
            ("city", vec!["Austin", "Denver", "Miami"]),
            ("state", vec!["TX", "CO"]),
        ]);
        let plan = plan(&template(), &bindings).unwrap();
        assert_eq!(plan.total(), 12);
        assert_eq!(plan.variable_order(), vec!["service", "city", "state"]);
        assert!(plan.warnings().is_empty());
    }

    #[test]
    fn test_missing_lists_exactly_unbound() {
        let template = Template::builder("{a} {b}").build();
        let bindings = value_sets([("a", vec!["x"])]);
        match plan(&template, &bindings) {
            Err(Error::MissingData { missing, available }) => {
                assert_eq!(missing, vec!["b"]);
                assert_eq!(available, vec!["a"]);
            }
            other => panic!("expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_value_set_counts_as_missing() {
        let template = Template::builder("{a} {b}").build();
        let mut bindings = value_sets([("a", vec!["x"])]);
        bindings.insert("b".into(), ValueSet::new(Vec::<String>::new()));
        let err = plan(&template, &bindings).unwrap_err();
        assert!(matches!(err, Error::MissingData { ref missing, .. } if missing == &["b"]));
    }

    #[test]
    fn test_large_and_very_large_warnings() {
        let thresholds = ScaleThresholds {
            large: 10,
            very_large: 20,
            small: 1,
        };
        let template = Template::builder("{a} {b}").build();
        let ten: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let two = vec!["x".to_string(), "y".to_string()];
        let three = vec!["x".to_string(), "y".to_string(), "z".to_string()];

        let large = plan_with(
            &template,
            &value_sets([("a", ten.clone()), ("b", two)]),
            &thresholds,
        )
        .unwrap();
        assert!(matches!(large.warnings(), [ScaleWarning::Large { total: 20, .. }]));

        let very_large = plan_with(
            &template,
            &value_sets([("a", ten), ("b", three)]),
            &thresholds,
        )
        .unwrap();
        assert!(matches!(
            very_large.warnings(),
            [ScaleWarning::VeryLarge { total: 30, .. }]
        ));
    }

    #[test]
    fn test_nth_decodes_mixed_radix() {
        let bindings = value_sets([
            ("service", vec!["Plumbing", "Roofing"]),
            ("city", vec!["Austin", "Denver", "Miami"]),
        ]);
        let plan = plan(&template(), &bindings).unwrap();
        let fourth = plan.nth(4).unwrap();
        assert_eq!(fourth["service"], "Roofing");
        assert_eq!(fourth["city"], "Denver");
        assert!(plan.nth(6).is_none());
    }
}
