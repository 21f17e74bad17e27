//! Declared filter rules and request validation.
//!
//! A [`FilterRuleSet`] is an ordered table of `(name, constraint, predicate)`
//! entries. Validation checks each present parameter against its rule's
//! constraint and produces [`ValidatedFilters`], which the engine then applies
//! in declaration order. Parameters without a rule never reach the engine.

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    sea_query::{Alias, Expr, Query},
};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::request::{FilterRequest, FilterValue};
use super::sort::SortSpec;
use crate::errors::ApiError;
use crate::validation::{ValidationError, ValidationErrors, validators};

/// A table whose ids a parameter may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTable {
    pub name: &'static str,
    /// Rows with `deleted_at` set do not count as existing
    pub soft_deletes: bool,
}

impl ReferenceTable {
    pub const SKILLS: Self = Self {
        name: "skills",
        soft_deletes: false,
    };
    pub const PROFESSIONS: Self = Self {
        name: "professions",
        soft_deletes: true,
    };
}

/// Existence checks for referenced ids
#[async_trait]
pub trait ReferenceLookup: Sync {
    /// The subset of `ids` that exist in `table`
    async fn existing_ids(&self, table: ReferenceTable, ids: &[i32]) -> Result<HashSet<i32>, DbErr>;
}

async fn fetch_existing_ids<C: ConnectionTrait>(
    db: &C,
    table: ReferenceTable,
    ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut query = Query::select();
    query
        .column(Alias::new("id"))
        .from(Alias::new(table.name))
        .and_where(Expr::col(Alias::new("id")).is_in(ids.iter().copied()));
    if table.soft_deletes {
        query.and_where(Expr::col(Alias::new("deleted_at")).is_null());
    }

    let statement = db.get_database_backend().build(&query);
    db.query_all(statement)
        .await?
        .iter()
        .map(|row| row.try_get::<i32>("", "id"))
        .collect()
}

#[async_trait]
impl ReferenceLookup for DatabaseConnection {
    async fn existing_ids(&self, table: ReferenceTable, ids: &[i32]) -> Result<HashSet<i32>, DbErr> {
        fetch_existing_ids(self, table, ids).await
    }
}

#[async_trait]
impl ReferenceLookup for DatabaseTransaction {
    async fn existing_ids(&self, table: ReferenceTable, ids: &[i32]) -> Result<HashSet<i32>, DbErr> {
        fetch_existing_ids(self, table, ids).await
    }
}

/// What a parameter value must look like
#[derive(Debug, Clone, Copy)]
pub enum Constraint {
    /// A non-blank scalar
    Filled,
    /// A scalar from a fixed set, compared verbatim
    OneOf(&'static [&'static str]),
    /// A `DD/MM/YYYY` calendar date
    Date,
    /// An array of integer ids, each present in the table
    ExistingIds(ReferenceTable),
    /// A sort token over the given whitelist
    SortableColumn(&'static [&'static str]),
}

/// What happens to a value that fails its constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// The whole request fails with a per-field error
    Reject,
    /// The value is dropped and the rule is skipped
    Ignore,
}

/// Augments the accumulated query with one parameter
pub type Predicate<Q> = fn(Q, &FilterValue) -> Q;

pub struct FilterRule<Q> {
    pub name: &'static str,
    pub constraint: Constraint,
    pub strictness: Strictness,
    pub predicate: Predicate<Q>,
}

impl<Q> std::fmt::Debug for FilterRule<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRule")
            .field("name", &self.name)
            .field("constraint", &self.constraint)
            .field("strictness", &self.strictness)
            .finish_non_exhaustive()
    }
}

/// Ordered registration table of filter rules.
///
/// ```rust,ignore
/// let rules = FilterRuleSet::new()
///     .rule("state", Constraint::OneOf(&["active", "inactive"]), filter_state)
///     .lenient_rule("order", Constraint::SortableColumn(&["email"]), order_by);
/// ```
#[derive(Debug)]
pub struct FilterRuleSet<Q> {
    rules: Vec<FilterRule<Q>>,
}

impl<Q> Default for FilterRuleSet<Q> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<Q> FilterRuleSet<Q> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule whose invalid values reject the request
    #[must_use]
    pub fn rule(self, name: &'static str, constraint: Constraint, predicate: Predicate<Q>) -> Self {
        self.register(name, constraint, Strictness::Reject, predicate)
    }

    /// Register a rule whose invalid values are dropped
    #[must_use]
    pub fn lenient_rule(
        self,
        name: &'static str,
        constraint: Constraint,
        predicate: Predicate<Q>,
    ) -> Self {
        self.register(name, constraint, Strictness::Ignore, predicate)
    }

    fn register(
        mut self,
        name: &'static str,
        constraint: Constraint,
        strictness: Strictness,
        predicate: Predicate<Q>,
    ) -> Self {
        // re-registering a name replaces the rule in place
        let rule = FilterRule {
            name,
            constraint,
            strictness,
            predicate,
        };
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &FilterRule<Q>> {
        self.rules.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilterRule<Q>> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }

    /// Check every present parameter against its rule.
    ///
    /// Returns the accepted values in declaration order, or every field error
    /// found when a `Reject` rule fails. Database errors from the reference
    /// lookup surface as `ApiError::Database`.
    pub async fn validate<L>(&self, request: &FilterRequest, lookup: &L) -> Result<ValidatedFilters, ApiError>
    where
        L: ReferenceLookup + ?Sized,
    {
        let mut accepted = Vec::new();
        let mut errors = ValidationErrors::new();

        for rule in &self.rules {
            let Some(value) = request.get(rule.name) else {
                continue;
            };

            match check(rule.name, rule.constraint, value, lookup).await? {
                Ok(normalized) => accepted.push((rule.name, normalized)),
                Err(error) => match rule.strictness {
                    Strictness::Reject => errors.add(error),
                    Strictness::Ignore => {
                        tracing::debug!(
                            filter = rule.name,
                            value = ?value,
                            reason = %error.message,
                            "Dropping invalid filter value"
                        );
                    }
                },
            }
        }

        errors.result()?;
        Ok(ValidatedFilters { entries: accepted })
    }
}

/// Outer error is a lookup failure, inner error a constraint failure
async fn check<L>(
    field: &str,
    constraint: Constraint,
    value: &FilterValue,
    lookup: &L,
) -> Result<Result<FilterValue, ValidationError>, DbErr>
where
    L: ReferenceLookup + ?Sized,
{
    let outcome = match constraint {
        Constraint::Filled => scalar(field, value).and_then(|text| {
            validators::validate_required(field, text).map(|()| FilterValue::from(text))
        }),
        Constraint::OneOf(allowed) => scalar(field, value).and_then(|text| {
            validators::validate_one_of(field, text, allowed).map(|()| FilterValue::from(text))
        }),
        Constraint::Date => scalar(field, value).and_then(|text| {
            validators::parse_date(field, text).map(|_| FilterValue::from(text))
        }),
        Constraint::SortableColumn(whitelist) => SortSpec::from_value(value, whitelist)
            .map(|spec| FilterValue::from(spec.token()))
            .ok_or_else(|| {
                ValidationError::new(
                    field,
                    format!("The {} is not a valid sort column.", validators::label(field)),
                )
            }),
        Constraint::ExistingIds(table) => return check_ids(field, table, value, lookup).await,
    };

    Ok(outcome)
}

fn scalar<'a>(field: &str, value: &'a FilterValue) -> Result<&'a str, ValidationError> {
    value.as_single().map(str::trim).ok_or_else(|| {
        ValidationError::new(
            field,
            format!("The {} must be a string.", validators::label(field)),
        )
    })
}

async fn check_ids<L>(
    field: &str,
    table: ReferenceTable,
    value: &FilterValue,
    lookup: &L,
) -> Result<Result<FilterValue, ValidationError>, DbErr>
where
    L: ReferenceLookup + ?Sized,
{
    let Some(raw) = value.as_many() else {
        return Ok(Err(ValidationError::new(
            field,
            format!("The {} must be an array.", validators::label(field)),
        )));
    };

    let mut ids: Vec<i32> = Vec::with_capacity(raw.len());
    for item in raw {
        match validators::parse_id(field, item) {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(error) => return Ok(Err(error)),
        }
    }

    let existing = lookup.existing_ids(table, &ids).await?;
    if ids.iter().any(|id| !existing.contains(id)) {
        return Ok(Err(ValidationError::new(
            field,
            format!("The selected {} is invalid.", validators::label(field)),
        )));
    }

    Ok(Ok(FilterValue::Many(ids.iter().map(ToString::to_string).collect())))
}

/// Parameters that passed validation, normalized, in rule declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedFilters {
    entries: Vec<(&'static str, FilterValue)>,
}

impl ValidatedFilters {
    /// Accept every present parameter that has a rule, without checking it.
    ///
    /// For trusted callers only; predicates still see raw values.
    #[must_use]
    pub fn trusted<Q>(request: &FilterRequest, rules: &FilterRuleSet<Q>) -> Self {
        let entries = rules
            .rules()
            .filter_map(|rule| request.get(rule.name).map(|value| (rule.name, value.clone())))
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    #[must_use]
    pub fn single(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FilterValue::as_single)
    }

    /// Integer ids of an array parameter; elements that are not ids are skipped
    #[must_use]
    pub fn ids(&self, name: &str) -> Vec<i32> {
        self.get(name)
            .and_then(FilterValue::as_many)
            .map(|values| values.iter().filter_map(|v| v.trim().parse().ok()).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Serialize for ValidatedFilters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
