//! # Composable List Filtering
//!
//! Turns raw query-string parameters into a narrowed, ordered database query.
//!
//! 1. [`FilterRequest`] collects the parameters (`skills[]=1&skills[]=2`
//!    becomes one array value).
//! 2. A [`FilterRuleSet`] declares which parameters exist, what their values
//!    must look like and how each one narrows the query.
//! 3. [`FilterRuleSet::validate`] checks the request and yields
//!    [`ValidatedFilters`], or a 422 with every failing field.
//! 4. [`FilterEngine::apply`] folds the accepted values into the query in
//!    declaration order.
//! 5. [`pagination_query`] and [`PageLinks`] carry the active filters into
//!    page links; [`SortableLinks`] does the same for column headers.
//!
//! ## Query Parameter Examples
//!
//! ```text
//! GET /users?search=duilio&state=active
//! GET /users?skills[]=1&skills[]=3&role=admin
//! GET /users?from=01/10/2020&to=31/10/2020
//! GET /users?order=first_name-desc&page=2
//! ```
//!
//! A sort token that is not `column` or `column-desc` over the whitelist is
//! dropped and the listing keeps its default order.

pub mod engine;
pub mod pagination;
pub mod request;
pub mod rules;
pub mod search;
pub mod sort;

pub use engine::FilterEngine;
pub use pagination::{
    DEFAULT_PER_PAGE, PageLinks, Paginated, calculate_content_range, last_page, pagination_query,
    parse_page,
};
pub use request::{FilterRequest, FilterValue};
pub use rules::{
    Constraint, FilterRule, FilterRuleSet, Predicate, ReferenceLookup, ReferenceTable, Strictness,
    ValidatedFilters,
};
pub use search::escape_like_wildcards;
pub use sort::{ColumnAliases, SortDirection, SortSpec, SortableLinks};
