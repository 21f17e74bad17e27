#![allow(dead_code)]

use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use roster::entities::{logins, professions, skill_user, skills, teams, user_profiles, users};
use roster::users::hash_password;
use roster::{AppState, Migrator, router};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;

static NEXT_EMAIL: AtomicUsize = AtomicUsize::new(1);

/// Every factory user shares the password "secret"
static SECRET_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("secret").expect("Failed to hash password"));

// Helper function to get database URL from environment or default to SQLite
fn get_test_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(get_test_database_url()).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn setup_test_app(db: &DatabaseConnection) -> Router {
    router(AppState::new(db.clone(), 15))
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

/// Builds a users row with sensible defaults and an explicit `created_at`
pub struct UserFactory {
    first_name: String,
    last_name: String,
    email: Option<String>,
    role: String,
    active: bool,
    team_id: Option<i32>,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl UserFactory {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: None,
            role: "user".to_string(),
            active: true,
            team_id: None,
            created_at: at(2020, 1, 1, 12, 0, 0),
            deleted_at: None,
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn team(mut self, team: &teams::Model) -> Self {
        self.team_id = Some(team.id);
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn trashed(mut self) -> Self {
        self.deleted_at = Some(at(2021, 1, 1, 0, 0, 0));
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> users::Model {
        let email = self.email.unwrap_or_else(|| {
            format!("user{}@example.com", NEXT_EMAIL.fetch_add(1, Ordering::Relaxed))
        });
        users::ActiveModel {
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            email: Set(email),
            password: Set(SECRET_HASH.clone()),
            role: Set(self.role),
            active: Set(self.active),
            team_id: Set(self.team_id),
            created_at: Set(self.created_at),
            updated_at: Set(self.created_at),
            deleted_at: Set(self.deleted_at),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }
}

pub async fn create_team(db: &DatabaseConnection, name: &str) -> teams::Model {
    teams::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_skill(db: &DatabaseConnection, name: &str) -> skills::Model {
    skills::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_profession(db: &DatabaseConnection, title: &str) -> professions::Model {
    professions::ActiveModel {
        title: Set(title.to_string()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_profile(db: &DatabaseConnection, user: &users::Model, bio: &str) {
    user_profiles::ActiveModel {
        user_id: Set(user.id),
        bio: Set(bio.to_string()),
        twitter: Set(None),
        profession_id: Set(None),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn attach_skill(db: &DatabaseConnection, user: &users::Model, skill: &skills::Model) {
    skill_user::ActiveModel {
        user_id: Set(user.id),
        skill_id: Set(skill.id),
        created_at: Set(user.created_at),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn create_login(db: &DatabaseConnection, user: &users::Model, when: DateTime<Utc>) {
    logins::ActiveModel {
        user_id: Set(user.id),
        created_at: Set(when),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

async fn read_json(response: axum::response::Response) -> (StatusCode, HeaderMap, Value) {
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, headers, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    read_json(app.clone().oneshot(request).await.unwrap()).await
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let (status, _, json) = read_json(app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()).await;
    (status, json)
}

/// Listing URI with a URL-encoded query
pub fn users_uri(pairs: &[(&str, &str)]) -> String {
    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", url_escape::encode_query(k), url_escape::encode_component(v)))
        .collect();
    if query.is_empty() {
        "/users".to_string()
    } else {
        format!("/users?{}", query.join("&"))
    }
}

/// Emails of the listed page, in response order
pub fn emails(listing: &Value) -> Vec<String> {
    listing["users"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap().to_string())
        .collect()
}

/// Field names reported in a 422 body
pub fn error_fields(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .map(|d| d["field"].as_str().unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}
