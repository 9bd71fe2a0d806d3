mod common;

use axum::http::StatusCode;
use std::time::Duration;

use common::{create_test_user, generate_unique_email, get, patch, post, register};
use learnmart::learnmart_cache::OtpStore;
use learnmart::learnmart_models::UserRole;
use learnmart::testing::TestApp;
use serde_json::json;

async fn sign_in(app: &TestApp, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    post(
        app,
        "/api/auth/sign-in",
        None,
        json!({ "email": email, "password": password }),
    )
    .await
}

#[tokio::test]
async fn test_sign_up_verify_and_sign_in() {
    let app = TestApp::new();
    let email = generate_unique_email();

    let (status, body) = post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": email, "password": "password123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "OTP send successfully");

    let otp = app.mailer.last_otp(&email).unwrap();
    let (status, body) = post(
        &app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": email, "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["role"], "student");
    assert_eq!(body["data"]["coins"], 0);
    assert!(body["data"].get("passwordHash").is_none());

    let (status, body) = sign_in(&app, &email, "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["status"], "success");
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
    assert_eq!(body["data"]["user"]["email"], email);
}

#[tokio::test]
async fn test_sign_up_normalizes_email() {
    let app = TestApp::new();
    let email = generate_unique_email();

    let (status, _) = post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": email.to_uppercase(), "password": "password123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.mailer.last_otp(&email).is_some());
}

#[tokio::test]
async fn test_sign_up_existing_email_rejected() {
    let app = TestApp::new();
    let email = generate_unique_email();
    register(&app, "Ada", &email, "password123").await;

    let (status, body) = post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": email, "password": "password123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn test_sign_up_validation_errors() {
    let app = TestApp::new();

    let (status, body) = post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": "not-an-email", "password": "short" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == "email"));
    assert!(errors.iter().any(|e| e["field"] == "password"));
}

#[tokio::test]
async fn test_sign_up_missing_field_is_malformed() {
    let app = TestApp::new();

    let (status, body) = post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "email": generate_unique_email(), "password": "password123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "name");
}

#[tokio::test]
async fn test_verify_wrong_otp() {
    let app = TestApp::new();
    let email = generate_unique_email();
    post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": email, "password": "password123" }),
    )
    .await;

    let otp = app.mailer.last_otp(&email).unwrap();
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    let (status, body) = post(
        &app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": email, "otp": wrong }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid OTP");

    // The correct code still works after a miss
    let (status, _) = post(
        &app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": email, "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_verify_gives_up_after_max_attempts() {
    let app = TestApp::new();
    let email = generate_unique_email();
    post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": email, "password": "password123" }),
    )
    .await;

    let otp = app.mailer.last_otp(&email).unwrap();
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    for _ in 0..4 {
        let (status, body) = post(
            &app,
            "/api/auth/verify-otp",
            None,
            json!({ "email": email, "otp": wrong }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid OTP");
    }

    let (status, body) = post(
        &app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": email, "otp": wrong }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Too many invalid attempts, please sign up again");

    // The pending sign-up is gone, so even the right code fails now
    let (status, body) = post(
        &app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": email, "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "OTP has expired, please sign up again");
    assert!(app.state.repos.users.find_by_email(&email).await.unwrap().is_none());
}

#[tokio::test]
async fn test_resend_otp_keeps_original_expiry() {
    let app = TestApp::new();
    let email = generate_unique_email();
    post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": email, "password": "password123" }),
    )
    .await;

    // Past the cooldown, with only half a minute left to live
    let mut pending = app.otp_store.get(&email).await.unwrap().unwrap();
    pending.last_sent_at -= 120;
    app.otp_store
        .put(&pending, Duration::from_secs(30))
        .await
        .unwrap();

    let (status, body) = post(&app, "/api/auth/resend-otp", None, json!({ "email": email })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OTP send successfully");

    let remaining = app.otp_store.remaining(&email).await.unwrap().unwrap();
    assert!(remaining <= Duration::from_secs(30));

    let otp = app.mailer.last_otp(&email).unwrap();
    let (status, _) = post(
        &app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": email, "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_verify_without_pending_sign_up() {
    let app = TestApp::new();

    let (status, _) = post(
        &app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": generate_unique_email(), "otp": "123456" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resend_otp_respects_cooldown() {
    let app = TestApp::new();
    let email = generate_unique_email();
    post(
        &app,
        "/api/auth/sign-up",
        None,
        json!({ "name": "Ada", "email": email, "password": "password123" }),
    )
    .await;

    let (status, _) = post(&app, "/api/auth/resend-otp", None, json!({ "email": email })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_in_invalid_credentials() {
    let app = TestApp::new();
    let email = generate_unique_email();
    register(&app, "Ada", &email, "password123").await;

    let (status, body) = sign_in(&app, &email, "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = sign_in(&app, &generate_unique_email(), "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_blocked_user_cannot_sign_in() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let email = generate_unique_email();
    let user = register(&app, "Ada", &email, "password123").await;

    let (status, _) = patch(
        &app,
        &format!("/api/users/{}/block", user["data"]["id"].as_str().unwrap()),
        Some(&admin.token),
        json!({ "isBlocked": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = sign_in(&app, &email, "password123").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_and_sign_out() {
    let app = TestApp::new();
    let email = generate_unique_email();
    register(&app, "Ada", &email, "password123").await;

    let (_, body) = sign_in(&app, &email, "password123").await;
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/api/auth/refresh-token",
        None,
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());

    let (status, _) = post(
        &app,
        "/api/auth/sign-out",
        None,
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/api/auth/refresh-token",
        None,
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_garbage_token() {
    let app = TestApp::new();

    let (status, _) = post(
        &app,
        "/api/auth/refresh-token",
        None,
        json!({ "refreshToken": "not.a.jwt" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = TestApp::new();
    let email = generate_unique_email();
    register(&app, "Ada", &email, "password123").await;
    let (_, body) = sign_in(&app, &email, "password123").await;
    let old_refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, _) = post(
        &app,
        "/api/auth/forgot-password",
        None,
        json!({ "email": email }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = app.mailer.last_reset_token(&email).unwrap();
    let (status, _) = post(
        &app,
        "/api/auth/reset-password",
        None,
        json!({ "email": email, "token": token, "password": "newpassword456" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = sign_in(&app, &email, "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = sign_in(&app, &email, "newpassword456").await;
    assert_eq!(status, StatusCode::OK);

    // Existing sessions are revoked by the reset
    let (status, _) = post(
        &app,
        "/api/auth/refresh-token",
        None,
        json!({ "refreshToken": old_refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forgot_password_unknown_email_still_succeeds() {
    let app = TestApp::new();
    let email = generate_unique_email();

    let (status, _) = post(
        &app,
        "/api/auth/forgot-password",
        None,
        json!({ "email": email }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.mailer.last_reset_token(&email).is_none());
}

#[tokio::test]
async fn test_reset_token_bound_to_email() {
    let app = TestApp::new();
    let email = generate_unique_email();
    let other = generate_unique_email();
    register(&app, "Ada", &email, "password123").await;
    register(&app, "Bob", &other, "password123").await;

    let token = app.state.tokens.issue_reset_token(&email).unwrap();
    let (status, _) = post(
        &app,
        "/api/auth/reset-password",
        None,
        json!({ "email": other, "token": token, "password": "newpassword456" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new();

    let (status, _) = get(&app, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "/api/auth/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = create_test_user(&app, UserRole::Student, 0).await;
    let (status, body) = get(&app, "/api/auth/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], user.email);
}
