//! Lazy, restartable enumeration of a combination plan
//!
//! Enumeration walks the product like an odometer: the last declared variable
//! varies fastest and values keep their value-set order. Re-invoking
//! `enumerate` on the same plan always yields the same sequence.

use super::{Assignment, CombinationPlan};

/// Iterator over assignments of a plan
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    plan: &'a CombinationPlan,
    /// Per-variable value positions of the next assignment
    cursor: Vec<usize>,
    position: u64,
    end: u64,
}

impl<'a> Combinations<'a> {
    pub(super) fn new(plan: &'a CombinationPlan, offset: u64, limit: Option<u64>) -> Self {
        let start = offset.min(plan.total());
        let end = match limit {
            Some(limit) => start.saturating_add(limit).min(plan.total()),
            None => plan.total(),
        };

        let mut cursor = vec![0; plan.variables().len()];
        let mut remaining = start;
        for (slot, variable) in cursor.iter_mut().zip(plan.variables()).rev() {
            let radix = variable.values.len() as u64;
            *slot = (remaining % radix) as usize;
            remaining /= radix;
        }

        Self {
            plan,
            cursor,
            position: start,
            end,
        }
    }

    /// Index of the next assignment within the full plan
    pub fn position(&self) -> u64 {
        self.position
    }

    fn advance(&mut self) {
        for (slot, variable) in self.cursor.iter_mut().zip(self.plan.variables()).rev() {
            *slot += 1;
            if *slot < variable.values.len() {
                return;
            }
            *slot = 0;
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.end {
            return None;
        }

        let assignment = self
            .cursor
            .iter()
            .zip(self.plan.variables())
            .map(|(&slot, variable)| (variable.name.clone(), variable.values[slot].clone()))
            .collect();

        self.position += 1;
        self.advance();
        Some(assignment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.position;
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Fixed-size chunks of a [`Combinations`] iterator
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    inner: Combinations<'a>,
    batch_size: usize,
}

impl<'a> Batches<'a> {
    pub(super) fn new(inner: Combinations<'a>, batch_size: usize) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
        }
    }
}

impl Iterator for Batches<'_> {
    type Item = Vec<Assignment>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<Assignment> = self.inner.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::plan::plan;
    use crate::template::Template;
    use crate::values::value_sets;

    fn pairs(plan: &crate::plan::CombinationPlan, limit: Option<u64>) -> Vec<(String, String)> {
        plan.enumerate(limit)
            .map(|a| (a["service"].clone(), a["city"].clone()))
            .collect()
    }

    fn example_plan() -> crate::plan::CombinationPlan {
        let template = Template::builder("Best {service} in {city}").build();
        let bindings = value_sets([
            ("service", vec!["Plumbing", "Roofing"]),
            ("city", vec!["Austin", "Denver"]),
        ]);
        plan(&template, &bindings).unwrap()
    }

    #[test]
    fn test_declared_order() {
        let plan = example_plan();
        let expected: Vec<(String, String)> = [
            ("Plumbing", "Austin"),
            ("Plumbing", "Denver"),
            ("Roofing", "Austin"),
            ("Roofing", "Denver"),
        ]
        .iter()
        .map(|(s, c)| (s.to_string(), c.to_string()))
        .collect();
        assert_eq!(pairs(&plan, None), expected);
    }

    #[test]
    fn test_restartable_and_limited() {
        let plan = example_plan();
        assert_eq!(pairs(&plan, None), pairs(&plan, None));
        assert_eq!(pairs(&plan, Some(3)).len(), 3);
        assert_eq!(pairs(&plan, Some(0)).len(), 0);
        assert_eq!(pairs(&plan, Some(100)).len(), 4);
    }

    #[test]
    fn test_enumerate_from_matches_nth() {
        let plan = example_plan();
        let resumed: Vec<_> = plan.enumerate_from(2, None).collect();
        assert_eq!(resumed.len(), 2);
        assert_eq!(Some(resumed[0].clone()), plan.nth(2));
        assert_eq!(Some(resumed[1].clone()), plan.nth(3));
    }

    #[test]
    fn test_batches() {
        let plan = example_plan();
        let sizes: Vec<usize> = plan.batches(3, None).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 1]);
    }

    #[test]
    fn test_size_hint() {
        let plan = example_plan();
        let mut iter = plan.enumerate(None);
        iter.next();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.position(), 1);
    }
}
