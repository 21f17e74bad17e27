//! Applies accepted filter values to a query accumulator.
//!
//! The engine is generic over the accumulator: anything threaded by value
//! through the rule predicates. It only composes, it never executes.

use super::request::FilterRequest;
use super::rules::{FilterRuleSet, ValidatedFilters};

pub struct FilterEngine;

impl FilterEngine {
    /// Fold each accepted value into `base`, in rule declaration order.
    ///
    /// Distinct parameters compose by AND because every predicate narrows the
    /// query it receives. Keys missing from either side are skipped.
    pub fn apply<Q>(base: Q, filters: &ValidatedFilters, rules: &FilterRuleSet<Q>) -> Q {
        rules.rules().fold(base, |query, rule| match filters.get(rule.name) {
            Some(value) => {
                tracing::debug!(filter = rule.name, "Applying filter");
                (rule.predicate)(query, value)
            }
            None => query,
        })
    }

    /// Same as [`FilterEngine::apply`] but straight from the raw request,
    /// without the constraint layer.
    pub fn apply_unvalidated<Q>(base: Q, request: &FilterRequest, rules: &FilterRuleSet<Q>) -> Q {
        Self::apply(base, &ValidatedFilters::trusted(request, rules), rules)
    }
}
