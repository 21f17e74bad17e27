//! JSON endpoints for the user roster.

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, patch},
};
use hyper::HeaderMap;
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

use crate::errors::ApiError;
use crate::filtering::{FilterRequest, calculate_content_range};
use crate::users::{ListOptions, UserDetails, UserForm, UserListing, operations};
use crate::validation::{ValidationError, ValidationErrors};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub per_page: u64,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection, per_page: u64) -> Self {
        Self { db, per_page }
    }
}

/// Every roster route, with request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/trash", get(list_trashed_users))
        .route(
            "/users/{id}",
            get(show_user).put(update_user).delete(destroy_user),
        )
        .route("/users/{id}/trash", patch(trash_user))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn listing(
    state: &AppState,
    query: Option<String>,
    options: ListOptions,
) -> Result<(HeaderMap, Json<UserListing>), ApiError> {
    let request = FilterRequest::from_query(query.as_deref().unwrap_or_default());
    let listing = operations::list(&state.db, &request, &options.per_page(state.per_page)).await?;

    let page = &listing.users;
    let headers = calculate_content_range(
        page.offset(),
        page.items.len() as u64,
        page.total,
        "users",
    );
    Ok((headers, Json(listing)))
}

async fn list_users(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<(HeaderMap, Json<UserListing>), ApiError> {
    listing(&state, query, ListOptions::active()).await
}

async fn list_trashed_users(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<(HeaderMap, Json<UserListing>), ApiError> {
    listing(&state, query, ListOptions::trashed()).await
}

async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserDetails>, ApiError> {
    operations::show(&state.db, id).await.map(Json)
}

/// Malformed bodies are reported the same way as failed field rules
fn form(payload: Result<Json<UserForm>, JsonRejection>) -> Result<UserForm, ApiError> {
    payload.map(|Json(form)| form).map_err(|rejection| {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("body", rejection.body_text()));
        ApiError::validation_failed(errors)
    })
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDetails>), ApiError> {
    let form = form(payload)?;
    let user = operations::create(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Result<Json<UserDetails>, ApiError> {
    let form = form(payload)?;
    operations::update(&state.db, id, &form).await.map(Json)
}

async fn trash_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    operations::trash(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn destroy_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    operations::destroy(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
