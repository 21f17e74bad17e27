//! Base user query and the listing-only extensions around the filter rules.

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Select,
    prelude::DateTimeUtc,
    sea_query::{Expr, Order, Query, SimpleExpr},
};

use crate::entities::{logins, teams, users};

/// Which side of the trash a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashScope {
    Active,
    Trashed,
}

/// `team` pass-through parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamPresence {
    WithTeam,
    WithoutTeam,
}

impl TeamPresence {
    /// Unknown values mean "no constraint"
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("with_team") => Some(Self::WithTeam),
            Some("without_team") => Some(Self::WithoutTeam),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WithTeam => "with_team",
            Self::WithoutTeam => "without_team",
        }
    }
}

/// A users row plus its computed `last_login_at`
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct UserRow {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub team_id: Option<i32>,
    pub created_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
    pub last_login_at: Option<DateTimeUtc>,
}

/// Users on the requested side of the trash
#[must_use]
pub fn scoped(scope: TrashScope) -> Select<users::Entity> {
    let query = users::Entity::find();
    match scope {
        TrashScope::Active => query.filter(users::Column::DeletedAt.is_null()),
        TrashScope::Trashed => query.filter(users::Column::DeletedAt.is_not_null()),
    }
}

/// Adds `last_login_at`: the `created_at` of the user's most recent login
#[must_use]
pub fn with_last_login(query: Select<users::Entity>) -> Select<users::Entity> {
    let latest = Query::select()
        .column((logins::Entity, logins::Column::CreatedAt))
        .from(logins::Entity)
        .and_where(
            Expr::col((logins::Entity, logins::Column::UserId))
                .equals((users::Entity, users::Column::Id)),
        )
        .order_by((logins::Entity, logins::Column::CreatedAt), Order::Desc)
        .limit(1)
        .to_owned();

    query.expr_as(
        SimpleExpr::SubQuery(None, Box::new(latest.into_sub_query_statement())),
        "last_login_at",
    )
}

/// Restricts to users that do (or do not) belong to an existing team
#[must_use]
pub fn with_team_presence(
    query: Select<users::Entity>,
    presence: Option<TeamPresence>,
) -> Select<users::Entity> {
    let Some(presence) = presence else {
        return query;
    };

    let team = Query::select()
        .column((teams::Entity, teams::Column::Id))
        .from(teams::Entity)
        .and_where(
            Expr::col((teams::Entity, teams::Column::Id))
                .equals((users::Entity, users::Column::TeamId)),
        )
        .to_owned();

    match presence {
        TeamPresence::WithTeam => query.filter(Expr::exists(team)),
        TeamPresence::WithoutTeam => query.filter(Expr::exists(team).not()),
    }
}

/// Newest first; appended after any user-chosen order
#[must_use]
pub fn newest_first(query: Select<users::Entity>) -> Select<users::Entity> {
    query.order_by_desc(users::Column::CreatedAt)
}
