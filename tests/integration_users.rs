mod common;

use axum::http::StatusCode;
use common::{TEST_PASSWORD, create_test_user, get, patch, post};
use learnmart::learnmart_models::UserRole;
use learnmart::testing::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_get_and_update_profile() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;

    let (status, body) = get(&app, "/api/users/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], user.email);

    let (status, body) = patch(
        &app,
        "/api/users/me",
        Some(&user.token),
        json!({ "name": "  Grace  ", "bio": "Compilers", "avatarKey": "/avatars//grace.png" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Grace");
    assert_eq!(body["data"]["bio"], "Compilers");
    assert_eq!(body["data"]["avatarKey"], "avatars/grace.png");

    let (status, _) = patch(&app, "/api/users/me", Some(&user.token), json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_cannot_change_role_or_coins() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;

    let (status, body) = patch(
        &app,
        "/api/users/me",
        Some(&user.token),
        json!({ "role": "admin", "coins": 1000000 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "student");
    assert_eq!(body["data"]["coins"], 0);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;

    let (status, body) = patch(
        &app,
        "/api/users/me/password",
        Some(&user.token),
        json!({ "currentPassword": "wrong-password", "newPassword": "brandnew123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = patch(
        &app,
        "/api/users/me/password",
        Some(&user.token),
        json!({ "currentPassword": TEST_PASSWORD, "newPassword": "brandnew123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/api/auth/sign-in",
        None,
        json!({ "email": user.email, "password": "brandnew123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_lists_users_by_role() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;
    create_test_user(&app, UserRole::Instructor, 0).await;
    create_test_user(&app, UserRole::Instructor, 0).await;

    let (status, _) = get(&app, "/api/users", Some(&student.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get(&app, "/api/users?role=instructor", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 2);

    let (_, body) = get(
        &app,
        &format!("/api/users?search={}", student.email),
        Some(&admin.token),
    )
    .await;
    assert_eq!(body["data"]["meta"]["total"], 1);
}

#[tokio::test]
async fn test_block_revokes_sessions() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;

    let (_, body) = post(
        &app,
        "/api/auth/sign-in",
        None,
        json!({ "email": student.email, "password": TEST_PASSWORD }),
    )
    .await;
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_eq!(app.sessions.live_count(student.id), 1);

    let (status, body) = patch(
        &app,
        &format!("/api/users/{}/block", student.id),
        Some(&admin.token),
        json!({ "isBlocked": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isBlocked"], true);
    assert_eq!(app.sessions.live_count(student.id), 0);

    let (status, _) = post(
        &app,
        "/api/auth/refresh-token",
        None,
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = patch(
        &app,
        &format!("/api/users/{}/block", admin.id),
        Some(&admin.token),
        json!({ "isBlocked": true }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_changes_role() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;

    let (status, body) = patch(
        &app,
        &format!("/api/users/{}/role", student.id),
        Some(&admin.token),
        json!({ "role": "instructor" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "instructor");

    let (status, _) = patch(
        &app,
        &format!("/api/users/{}/role", admin.id),
        Some(&admin.token),
        json!({ "role": "student" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = patch(
        &app,
        &format!("/api/users/{}/role", uuid::Uuid::new_v4()),
        Some(&admin.token),
        json!({ "role": "student" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
