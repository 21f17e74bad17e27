// Show, trash and permanent deletion

use axum::http::StatusCode;
use roster::entities::{logins, skill_user, user_profiles, users};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

mod common;
use common::{
    UserFactory, at, attach_skill, create_login, create_profile, create_skill, get, send,
    setup_test_app, setup_test_db,
};

#[tokio::test]
async fn test_show_user_details() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);

    let php = create_skill(&db, "PHP").await;
    let user = UserFactory::new("Ana", "Lee").email("ana@example.com").create(&db).await;
    create_profile(&db, &user, "Hello").await;
    attach_skill(&db, &user, &php).await;

    let (status, _, body) = get(&app, &format!("/users/{}", user.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["profile"]["bio"], "Hello");
    assert_eq!(body["skills"][0]["name"], "PHP");
    assert!(body["team"].is_null());

    let (status, _, body) = get(&app, "/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User with ID '999' not found");
}

#[tokio::test]
async fn test_trash_soft_deletes_user_profile_and_skills() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);

    let php = create_skill(&db, "PHP").await;
    let user = UserFactory::new("Ana", "Lee").create(&db).await;
    create_profile(&db, &user, "Hello").await;
    attach_skill(&db, &user, &php).await;

    let (status, body) = send(&app, "PATCH", &format!("/users/{}/trash", user.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let trashed = users::Entity::find_by_id(user.id).one(&db).await.unwrap().unwrap();
    assert!(trashed.deleted_at.is_some());

    let profile = user_profiles::Entity::find()
        .filter(user_profiles::Column::UserId.eq(user.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(profile.deleted_at.is_some());

    let pivot = skill_user::Entity::find()
        .filter(skill_user::Column::UserId.eq(user.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(pivot.deleted_at.is_some());

    let (status, _, _) = get(&app, &format!("/users/{}", user.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PATCH", &format!("/users/{}/trash", user.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_destroy_removes_a_trashed_user_completely() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);

    let php = create_skill(&db, "PHP").await;
    let user = UserFactory::new("Ana", "Lee").trashed().create(&db).await;
    create_profile(&db, &user, "Hello").await;
    attach_skill(&db, &user, &php).await;
    create_login(&db, &user, at(2020, 5, 1, 0, 0, 0)).await;

    let (status, _) = send(&app, "DELETE", &format!("/users/{}", user.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(users::Entity::find_by_id(user.id).one(&db).await.unwrap().is_none());
    assert_eq!(user_profiles::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(skill_user::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(logins::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_destroy_refuses_users_not_in_the_trash() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(&db);

    let user = UserFactory::new("Ana", "Lee").create(&db).await;

    let (status, _) = send(&app, "DELETE", &format!("/users/{}", user.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(users::Entity::find_by_id(user.id).one(&db).await.unwrap().is_some());
}
