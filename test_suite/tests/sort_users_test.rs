// Ordering by public sort tokens, and the fallback for tokens that are not sortable

use axum::http::StatusCode;

mod common;
use common::{
    UserFactory, at, create_login, emails, get, setup_test_app, setup_test_db, users_uri,
};

async fn seed(db: &sea_orm::DatabaseConnection) {
    let john = UserFactory::new("John", "Doe")
        .email("john@example.com")
        .created_at(at(2020, 1, 2, 0, 0, 0))
        .create(db)
        .await;
    let richard = UserFactory::new("Richard", "Roe")
        .email("richard@example.com")
        .created_at(at(2020, 1, 3, 0, 0, 0))
        .create(db)
        .await;
    let jane = UserFactory::new("Jane", "Doe")
        .email("jane@example.com")
        .created_at(at(2020, 1, 1, 0, 0, 0))
        .create(db)
        .await;

    create_login(db, &john, at(2020, 3, 1, 0, 0, 0)).await;
    create_login(db, &richard, at(2020, 2, 1, 0, 0, 0)).await;
    create_login(db, &jane, at(2020, 4, 1, 0, 0, 0)).await;
}

async fn ordered(app: &axum::Router, order: &str) -> Vec<String> {
    let (status, _, body) = get(app, &users_uri(&[("order", order)])).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    emails(&body)
}

#[tokio::test]
async fn test_order_by_first_name() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);
    seed(&db).await;

    assert_eq!(
        ordered(&app, "first_name").await,
        vec!["jane@example.com", "john@example.com", "richard@example.com"]
    );
    assert_eq!(
        ordered(&app, "first_name-desc").await,
        vec!["richard@example.com", "john@example.com", "jane@example.com"]
    );
}

#[tokio::test]
async fn test_order_by_email() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);
    seed(&db).await;

    assert_eq!(
        ordered(&app, "email").await,
        vec!["jane@example.com", "john@example.com", "richard@example.com"]
    );
    assert_eq!(
        ordered(&app, "email-desc").await,
        vec!["richard@example.com", "john@example.com", "jane@example.com"]
    );
}

#[tokio::test]
async fn test_order_by_registration_date() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);
    seed(&db).await;

    assert_eq!(
        ordered(&app, "date").await,
        vec!["jane@example.com", "john@example.com", "richard@example.com"]
    );
    assert_eq!(
        ordered(&app, "date-desc").await,
        vec!["richard@example.com", "john@example.com", "jane@example.com"]
    );
}

#[tokio::test]
async fn test_order_by_last_login() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);
    seed(&db).await;

    assert_eq!(
        ordered(&app, "login").await,
        vec!["richard@example.com", "john@example.com", "jane@example.com"]
    );
    assert_eq!(
        ordered(&app, "login-desc").await,
        vec!["jane@example.com", "john@example.com", "richard@example.com"]
    );
}

#[tokio::test]
async fn test_unsortable_tokens_fall_back_to_newest_first() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);
    seed(&db).await;

    let newest_first = vec!["richard@example.com", "john@example.com", "jane@example.com"];
    for token in ["id", "invalid_column", "first_name-descendent", "asc-first_name", "password"] {
        assert_eq!(ordered(&app, token).await, newest_first, "{token}");

        let (_, _, body) = get(&app, &users_uri(&[("order", token)])).await;
        assert!(body["filters"].get("order").is_none(), "{token}");
    }
}

#[tokio::test]
async fn test_order_array_is_ignored() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);
    seed(&db).await;

    let (status, _, body) = get(&app, "/users?order%5B%5D=email").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        emails(&body),
        vec!["richard@example.com", "john@example.com", "jane@example.com"]
    );
}
