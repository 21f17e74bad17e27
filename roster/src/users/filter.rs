//! The user listing's filter rules.

use std::sync::LazyLock;

use sea_orm::{
    ColumnTrait, Condition, QueryFilter, QueryOrder, Select,
    sea_query::{Alias, Expr, Func, Query, SimpleExpr},
};

use crate::entities::{skill_user, teams, users};
use crate::filtering::{
    ColumnAliases, Constraint, FilterRuleSet, FilterValue, ReferenceTable, SortSpec, search,
};
use crate::validation::validators;

/// Public sort tokens accepted by `order`
pub const SORTABLE_COLUMNS: &[&str] = &["first_name", "email", "date", "login"];

/// Sort tokens that are not column names
pub const SORT_ALIASES: ColumnAliases =
    ColumnAliases::new(&[("date", "created_at"), ("login", "last_login_at")]);

pub const STATES: &[&str] = &["active", "inactive"];

pub const ROLES: &[&str] = &["user", "admin"];

/// The user listing rules, in application order
pub static USER_FILTERS: LazyLock<FilterRuleSet<Select<users::Entity>>> = LazyLock::new(|| {
    FilterRuleSet::new()
        .rule("search", Constraint::Filled, search_users)
        .rule("state", Constraint::OneOf(STATES), filter_state)
        .rule("role", Constraint::OneOf(ROLES), filter_role)
        .rule("skills", Constraint::ExistingIds(ReferenceTable::SKILLS), filter_skills)
        .rule("from", Constraint::Date, created_from)
        .rule("to", Constraint::Date, created_to)
        .lenient_rule("order", Constraint::SortableColumn(SORTABLE_COLUMNS), order_by_column)
});

/// Full name, email or team name contains the term, case-insensitively
fn search_users(query: Select<users::Entity>, value: &FilterValue) -> Select<users::Entity> {
    let Some(term) = value.as_single().filter(|t| !t.trim().is_empty()) else {
        return query;
    };
    let pattern = search::contains_pattern(term);

    let team_ids = Query::select()
        .column((teams::Entity, teams::Column::Id))
        .from(teams::Entity)
        .and_where(search::upper_like(
            Expr::col((teams::Entity, teams::Column::Name)),
            &pattern,
        ))
        .to_owned();

    query.filter(
        Condition::any()
            .add(search::upper_concat_like(
                r#""users"."first_name""#,
                r#""users"."last_name""#,
                &pattern,
            ))
            .add(search::upper_like(
                Expr::col((users::Entity, users::Column::Email)),
                &pattern,
            ))
            .add(Expr::col((users::Entity, users::Column::TeamId)).in_subquery(team_ids)),
    )
}

fn filter_state(query: Select<users::Entity>, value: &FilterValue) -> Select<users::Entity> {
    match value.as_single() {
        Some(state) => query.filter(users::Column::Active.eq(state == "active")),
        None => query,
    }
}

fn filter_role(query: Select<users::Entity>, value: &FilterValue) -> Select<users::Entity> {
    match value.as_single() {
        Some(role) => query.filter(users::Column::Role.eq(role)),
        None => query,
    }
}

/// The user has every listed skill
fn filter_skills(query: Select<users::Entity>, value: &FilterValue) -> Select<users::Entity> {
    let Some(raw) = value.as_many() else {
        return query;
    };
    let mut ids: Vec<i32> = Vec::with_capacity(raw.len());
    for id in raw.iter().filter_map(|v| v.trim().parse::<i32>().ok()) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return query;
    }

    let pivot = Alias::new("s");
    let matching = Query::select()
        .expr(Expr::col((pivot.clone(), skill_user::Column::Id)).count())
        .from_as(skill_user::Entity, pivot.clone())
        .and_where(
            Expr::col((pivot.clone(), skill_user::Column::UserId))
                .equals((users::Entity, users::Column::Id)),
        )
        .and_where(Expr::col((pivot, skill_user::Column::SkillId)).is_in(ids.iter().copied()))
        .to_owned();

    #[allow(clippy::cast_possible_wrap)]
    let wanted = ids.len() as i64;
    query.filter(
        Expr::expr(SimpleExpr::SubQuery(
            None,
            Box::new(matching.into_sub_query_statement()),
        ))
        .eq(wanted),
    )
}

fn created_date() -> SimpleExpr {
    Func::cust(Alias::new("DATE"))
        .arg(Expr::col((users::Entity, users::Column::CreatedAt)))
        .into()
}

fn created_from(query: Select<users::Entity>, value: &FilterValue) -> Select<users::Entity> {
    match value.as_single().map(|v| validators::parse_date("from", v)) {
        Some(Ok(date)) => query.filter(Expr::expr(created_date()).gte(date)),
        _ => query,
    }
}

fn created_to(query: Select<users::Entity>, value: &FilterValue) -> Select<users::Entity> {
    match value.as_single().map(|v| validators::parse_date("to", v)) {
        Some(Ok(date)) => query.filter(Expr::expr(created_date()).lte(date)),
        _ => query,
    }
}

/// Orders by the aliased column; an unparseable token leaves the query alone
fn order_by_column(query: Select<users::Entity>, value: &FilterValue) -> Select<users::Entity> {
    match SortSpec::from_value(value, SORTABLE_COLUMNS) {
        Some(spec) => {
            let column = SORT_ALIASES.resolve(spec.column);
            query.order_by(
                SimpleExpr::from(Expr::col(Alias::new(column))),
                spec.direction.order(),
            )
        }
        None => {
            tracing::debug!(order = ?value, "Ignoring unsortable order");
            query
        }
    }
}
