mod common;

use axum::http::{Method, StatusCode};
use common::{create_test_user, get, patch, post, send};
use learnmart::learnmart_models::UserRole;
use learnmart::testing::TestApp;
use serde_json::json;

async fn buy(app: &TestApp, token: &str, reference: &str) {
    let (status, _) = post(
        app,
        "/api/payments/coins/purchase",
        Some(token),
        json!({ "amount": 1, "paymentReference": reference }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_notifications_are_private() {
    let app = TestApp::new();
    let alice = create_test_user(&app, UserRole::Student, 0).await;
    let bob = create_test_user(&app, UserRole::Student, 0).await;
    buy(&app, &alice.token, "ref-alice").await;

    let (_, body) = get(&app, "/api/notifications", Some(&alice.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    let id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let (_, body) = get(&app, "/api/notifications", Some(&bob.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 0);

    let (status, _) = patch(
        &app,
        &format!("/api/notifications/{}/read", id),
        Some(&bob.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/notifications/{}", id),
        Some(&bob.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_read_and_unread_count() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;
    for reference in ["n-1", "n-2", "n-3"] {
        buy(&app, &user.token, reference).await;
    }

    let (_, body) = get(&app, "/api/notifications/unread-count", Some(&user.token)).await;
    assert_eq!(body["data"]["count"], 3);

    let (_, body) = get(&app, "/api/notifications", Some(&user.token)).await;
    let id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();
    let (status, body) = patch(
        &app,
        &format!("/api/notifications/{}/read", id),
        Some(&user.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isRead"], true);

    let (_, body) = get(&app, "/api/notifications?unreadOnly=true", Some(&user.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 2);

    let (status, _) = patch(&app, "/api/notifications/read-all", Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/api/notifications/unread-count", Some(&user.token)).await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_delete_notification() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;
    buy(&app, &user.token, "delete-me").await;

    let (_, body) = get(&app, "/api/notifications", Some(&user.token)).await;
    let id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/notifications/{}", id);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&user.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&user.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notifications_require_auth() {
    let app = TestApp::new();
    let (status, _) = get(&app, "/api/notifications", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
