//! User administration operations: list, show, create, update, trash, destroy.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::DateTimeUtc, sea_query::Expr,
};
use serde::Serialize;

use super::filter::{SORTABLE_COLUMNS, USER_FILTERS};
use super::forms::{FormMode, UserForm, ValidatedUser};
use super::query::{
    TeamPresence, TrashScope, UserRow, newest_first, scoped, with_last_login, with_team_presence,
};
use crate::entities::{logins, professions, skill_user, skills, teams, user_profiles, users};
use crate::errors::ApiError;
use crate::filtering::{
    DEFAULT_PER_PAGE, FilterEngine, FilterRequest, PageLinks, Paginated, SortableLinks,
    ValidatedFilters, last_page, pagination_query, parse_page,
};

/// Where and how a listing is paginated
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub scope: TrashScope,
    pub per_page: u64,
    /// Path the page and sort links point at
    pub base_url: String,
}

impl ListOptions {
    #[must_use]
    pub fn active() -> Self {
        Self {
            scope: TrashScope::Active,
            per_page: DEFAULT_PER_PAGE,
            base_url: "/users".to_string(),
        }
    }

    #[must_use]
    pub fn trashed() -> Self {
        Self {
            scope: TrashScope::Trashed,
            per_page: DEFAULT_PER_PAGE,
            base_url: "/users/trash".to_string(),
        }
    }

    #[must_use]
    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page.max(1);
        self
    }
}

/// One row of the listing
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub team: Option<String>,
    pub profession: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTimeUtc,
    pub last_login_at: Option<DateTimeUtc>,
    pub deleted_at: Option<DateTimeUtc>,
}

/// A column header link with its sort state
#[derive(Debug, Clone, Serialize)]
pub struct SortableColumn {
    pub column: &'static str,
    pub url: String,
    pub classes: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListing {
    pub users: Paginated<UserSummary>,
    /// The filters that were applied, normalized
    pub filters: ValidatedFilters,
    pub team: Option<&'static str>,
    pub checked_skills: Vec<i32>,
    /// Every skill, by name, for the filter form
    pub skills: Vec<skills::Model>,
    /// Query pairs carried into every page link
    pub query: Vec<(String, String)>,
    pub sortable: Vec<SortableColumn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileDetails {
    pub bio: String,
    pub twitter: Option<String>,
    pub profession: Option<professions::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: users::Model,
    pub name: String,
    pub team: Option<teams::Model>,
    pub profile: Option<ProfileDetails>,
    pub skills: Vec<skills::Model>,
}

/// Filtered, ordered, paginated listing of one side of the trash
pub async fn list(
    db: &DatabaseConnection,
    request: &FilterRequest,
    options: &ListOptions,
) -> Result<UserListing, ApiError> {
    let filters = USER_FILTERS.validate(request, db).await?;
    let team = TeamPresence::parse(request.single("team"));
    let page = parse_page(request.single("page"));

    let query = with_team_presence(with_last_login(scoped(options.scope)), team);
    let query = newest_first(FilterEngine::apply(query, &filters, &USER_FILTERS));

    let paginator = query
        .into_model::<UserRow>()
        .paginate(db, options.per_page.max(1));
    let total = paginator.num_items().await?;
    let rows = if page > last_page(total, options.per_page) {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };
    let items = summarize(db, rows).await?;

    let extra: Vec<(&str, &str)> = team.map(|t| ("team", t.as_str())).into_iter().collect();
    let query_pairs = pagination_query(&filters, &extra);
    let links = PageLinks::new(options.base_url.clone(), query_pairs.clone());

    let sortable_links = SortableLinks::new(options.base_url.clone(), filters.single("order"))
        .appends(query_pairs.clone());
    let sortable = SORTABLE_COLUMNS
        .iter()
        .map(|&column| SortableColumn {
            column,
            url: sortable_links.url(column),
            classes: sortable_links.classes(column),
        })
        .collect();

    let all_skills = skills::Entity::find()
        .order_by_asc(skills::Column::Name)
        .all(db)
        .await?;

    tracing::debug!(
        scope = ?options.scope,
        page,
        total,
        filters = filters.len(),
        "Listed users"
    );

    Ok(UserListing {
        users: Paginated::new(items, page, options.per_page.max(1), total, &links),
        checked_skills: filters.ids("skills"),
        filters,
        team: team.map(TeamPresence::as_str),
        skills: all_skills,
        query: query_pairs,
        sortable,
    })
}

/// Team, profession and skill names for a page of rows, fetched in batches
async fn summarize<C: ConnectionTrait>(db: &C, rows: Vec<UserRow>) -> Result<Vec<UserSummary>, ApiError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let team_ids: Vec<i32> = rows.iter().filter_map(|r| r.team_id).collect();

    let team_names: HashMap<i32, String> = if team_ids.is_empty() {
        HashMap::new()
    } else {
        teams::Entity::find()
            .filter(teams::Column::Id.is_in(team_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|team| (team.id, team.name))
            .collect()
    };

    let mut skill_names: HashMap<i32, Vec<String>> = HashMap::new();
    for (pivot, skill) in skill_user::Entity::find()
        .filter(skill_user::Column::UserId.is_in(user_ids.clone()))
        .find_also_related(skills::Entity)
        .order_by_asc(skills::Column::Name)
        .all(db)
        .await?
    {
        if let Some(skill) = skill {
            skill_names.entry(pivot.user_id).or_default().push(skill.name);
        }
    }

    let mut profession_titles: HashMap<i32, String> = HashMap::new();
    for (profile, profession) in user_profiles::Entity::find()
        .filter(user_profiles::Column::UserId.is_in(user_ids))
        .find_also_related(professions::Entity)
        .all(db)
        .await?
    {
        if let Some(profession) = profession {
            profession_titles.insert(profile.user_id, profession.title);
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            name: format!("{} {}", row.first_name, row.last_name),
            team: row.team_id.and_then(|id| team_names.get(&id).cloned()),
            profession: profession_titles.remove(&row.id),
            skills: skill_names.remove(&row.id).unwrap_or_default(),
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            role: row.role,
            active: row.active,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
            deleted_at: row.deleted_at,
        })
        .collect())
}

async fn find_active<C: ConnectionTrait>(db: &C, id: i32) -> Result<users::Model, ApiError> {
    users::Entity::find_by_id(id)
        .filter(users::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User", Some(id.to_string())))
}

async fn details<C: ConnectionTrait>(db: &C, user: users::Model) -> Result<UserDetails, ApiError> {
    let team = user.find_related(teams::Entity).one(db).await?;

    let profile = match user_profiles::Entity::find()
        .filter(user_profiles::Column::UserId.eq(user.id))
        .one(db)
        .await?
    {
        Some(profile) => {
            let profession = match profile.profession_id {
                Some(id) => professions::Entity::find_by_id(id).one(db).await?,
                None => None,
            };
            Some(ProfileDetails {
                bio: profile.bio,
                twitter: profile.twitter,
                profession,
            })
        }
        None => None,
    };

    let skills = user
        .find_related(skills::Entity)
        .order_by_asc(skills::Column::Name)
        .all(db)
        .await?;

    Ok(UserDetails {
        name: user.name(),
        user,
        team,
        profile,
        skills,
    })
}

/// A user that is not in the trash, with team, profile and skills
pub async fn show(db: &DatabaseConnection, id: i32) -> Result<UserDetails, ApiError> {
    let user = find_active(db, id).await?;
    details(db, user).await
}

async fn attach_skills<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    skill_ids: &[i32],
    now: DateTimeUtc,
) -> Result<(), ApiError> {
    if skill_ids.is_empty() {
        return Ok(());
    }
    let pivots = skill_ids.iter().map(|&skill_id| skill_user::ActiveModel {
        user_id: Set(user_id),
        skill_id: Set(skill_id),
        created_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    });
    skill_user::Entity::insert_many(pivots).exec(db).await?;
    Ok(())
}

/// Validate, then write the user, profile and skills in one transaction
pub async fn create(db: &DatabaseConnection, form: &UserForm) -> Result<UserDetails, ApiError> {
    let data = form.validate(db, FormMode::Create).await?;
    let password = data
        .password_hash
        .clone()
        .ok_or_else(|| ApiError::internal("Could not create the user", Some("password hash missing after validation".into())))?;
    let now = Utc::now();

    let txn = db.begin().await?;

    let user = users::ActiveModel {
        first_name: Set(data.first_name.clone()),
        last_name: Set(data.last_name.clone()),
        email: Set(data.email.clone()),
        password: Set(password),
        role: Set(data.role.clone()),
        active: Set(data.active),
        team_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    user_profiles::ActiveModel {
        user_id: Set(user.id),
        bio: Set(data.bio.clone()),
        twitter: Set(data.twitter.clone()),
        profession_id: Set(data.profession_id),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    attach_skills(&txn, user.id, &data.skills, now).await?;

    txn.commit().await?;
    tracing::info!(user_id = user.id, "User created");

    details(db, user).await
}

/// Validate, then update the user and profile and sync the skill set
pub async fn update(db: &DatabaseConnection, id: i32, form: &UserForm) -> Result<UserDetails, ApiError> {
    let user = find_active(db, id).await?;
    let ValidatedUser {
        first_name,
        last_name,
        email,
        password_hash,
        role,
        active,
        bio,
        twitter,
        profession_id,
        skills,
    } = form.validate(db, FormMode::Update { user_id: id }).await?;
    let now = Utc::now();

    let txn = db.begin().await?;

    let mut changes: users::ActiveModel = user.into();
    changes.first_name = Set(first_name);
    changes.last_name = Set(last_name);
    changes.email = Set(email);
    if let Some(hash) = password_hash {
        changes.password = Set(hash);
    }
    changes.role = Set(role);
    changes.active = Set(active);
    changes.updated_at = Set(now);
    let user = changes.update(&txn).await?;

    match user_profiles::Entity::find()
        .filter(user_profiles::Column::UserId.eq(id))
        .one(&txn)
        .await?
    {
        Some(profile) => {
            let mut profile: user_profiles::ActiveModel = profile.into();
            profile.bio = Set(bio);
            profile.twitter = Set(twitter);
            profile.profession_id = Set(profession_id);
            profile.update(&txn).await?;
        }
        None => {
            user_profiles::ActiveModel {
                user_id: Set(id),
                bio: Set(bio),
                twitter: Set(twitter),
                profession_id: Set(profession_id),
                deleted_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    // sync: drop unchecked skills, attach newly checked ones
    skill_user::Entity::delete_many()
        .filter(skill_user::Column::UserId.eq(id))
        .filter(skill_user::Column::SkillId.is_not_in(skills.clone()))
        .exec(&txn)
        .await?;
    let kept: Vec<i32> = skill_user::Entity::find()
        .select_only()
        .column(skill_user::Column::SkillId)
        .filter(skill_user::Column::UserId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;
    let added: Vec<i32> = skills.into_iter().filter(|s| !kept.contains(s)).collect();
    attach_skills(&txn, id, &added, now).await?;

    txn.commit().await?;
    tracing::info!(user_id = id, "User updated");

    details(db, user).await
}

/// Soft delete the user, their profile and their skill associations
pub async fn trash(db: &DatabaseConnection, id: i32) -> Result<(), ApiError> {
    let user = find_active(db, id).await?;
    let now = Utc::now();

    let txn = db.begin().await?;

    user_profiles::Entity::update_many()
        .col_expr(user_profiles::Column::DeletedAt, Expr::value(now))
        .filter(user_profiles::Column::UserId.eq(user.id))
        .filter(user_profiles::Column::DeletedAt.is_null())
        .exec(&txn)
        .await?;
    skill_user::Entity::update_many()
        .col_expr(skill_user::Column::DeletedAt, Expr::value(now))
        .filter(skill_user::Column::UserId.eq(user.id))
        .filter(skill_user::Column::DeletedAt.is_null())
        .exec(&txn)
        .await?;
    users::Entity::update_many()
        .col_expr(users::Column::DeletedAt, Expr::value(now))
        .filter(users::Column::Id.eq(user.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    tracing::info!(user_id = id, "User sent to trash");
    Ok(())
}

/// Permanently remove a trashed user and everything hanging off it.
///
/// Users that are not in the trash are reported as not found.
pub async fn destroy(db: &DatabaseConnection, id: i32) -> Result<(), ApiError> {
    let user = users::Entity::find_by_id(id)
        .filter(users::Column::DeletedAt.is_not_null())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User", Some(id.to_string())))?;

    let txn = db.begin().await?;

    skill_user::Entity::delete_many()
        .filter(skill_user::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;
    logins::Entity::delete_many()
        .filter(logins::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;
    user_profiles::Entity::delete_many()
        .filter(user_profiles::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;
    users::Entity::delete_by_id(user.id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(user_id = id, "User permanently deleted");
    Ok(())
}
