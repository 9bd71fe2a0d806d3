#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use learnmart::learnmart_core::hash_password;
use learnmart::learnmart_models::{User, UserRole};
use learnmart::testing::TestApp;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "testpass123";

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

pub fn generate_unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4())
}

/// Sends one request through a fresh router and returns the status and JSON body.
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

pub async fn get(app: &TestApp, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: &TestApp, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn patch(
    app: &TestApp,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, token, Some(body)).await
}

/// Inserts a user straight into the store and issues an access token for them.
pub async fn create_test_user(app: &TestApp, role: UserRole, coins: i64) -> TestUser {
    let email = generate_unique_email();
    let hashed = hash_password(TEST_PASSWORD).unwrap();
    let user = User::new("Test User", &email, hashed, role);
    app.state.repos.users.create(&user).await.unwrap();
    if coins > 0 {
        app.store.set_coins(user.id, coins).unwrap();
    }

    let token = app
        .state
        .tokens
        .issue_access_token(user.id, &user.email, role)
        .unwrap();

    TestUser {
        id: user.id,
        email: user.email,
        token,
    }
}

/// Runs sign-up and OTP verification through the API.
pub async fn register(app: &TestApp, name: &str, email: &str, password: &str) -> Value {
    let (status, _) = post(
        app,
        "/api/auth/sign-up",
        None,
        json!({ "name": name, "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let otp = app.mailer.last_otp(email).expect("OTP email was not sent");
    let (status, body) = post(
        app,
        "/api/auth/verify-otp",
        None,
        json!({ "email": email, "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

pub async fn create_category(app: &TestApp, admin: &TestUser, name: &str) -> Uuid {
    let (status, body) = post(
        app,
        "/api/categories",
        Some(&admin.token),
        json!({ "name": name, "description": "Test category" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

/// Creates a draft course with one section and returns `(course_id, section_id)`.
pub async fn create_course(
    app: &TestApp,
    instructor: &TestUser,
    category_id: Uuid,
    price: i64,
) -> (Uuid, Uuid) {
    let (status, body) = post(
        app,
        "/api/courses",
        Some(&instructor.token),
        json!({
            "title": "Rust for Beginners",
            "description": "Ownership, borrowing and lifetimes",
            "price": price,
            "categoryId": category_id,
            "level": "beginner"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let course_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    let (status, body) = post(
        app,
        &format!("/api/courses/{}/sections", course_id),
        Some(&instructor.token),
        json!({ "title": "Introduction" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let section_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    (course_id, section_id)
}

/// Object key inside the user's upload namespace.
pub fn upload_key(user: &TestUser, name: &str) -> String {
    format!("users/{}/{}", user.id, name)
}

/// Adds a lecture with a video key and returns its id.
pub async fn create_lecture(
    app: &TestApp,
    instructor: &TestUser,
    course_id: Uuid,
    section_id: Uuid,
) -> Uuid {
    let (status, body) = post(
        app,
        &format!("/api/courses/{}/sections/{}/lectures", course_id, section_id),
        Some(&instructor.token),
        json!({
            "title": "Hello, Cargo",
            "key": upload_key(instructor, "videos/hello.mp4"),
            "isPreview": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

/// Marks a lecture ready the way the transcoding worker would.
pub async fn mark_lecture_ready(
    app: &TestApp,
    instructor: &TestUser,
    course_id: Uuid,
    section_id: Uuid,
    lecture_id: Uuid,
) {
    let payload = json!({
        "event": "lecture.processed",
        "data": {
            "userId": instructor.id,
            "courseId": course_id,
            "sectionId": section_id,
            "lectureId": lecture_id,
            "key": "videos/hello-720p.mp4",
            "durationSeconds": 300
        }
    });
    learnmart::modules::courses::events::handle_lecture_event(&app.state, &payload.to_string())
        .await;
}

/// Creates a course with a ready lecture and publishes it.
pub async fn create_published_course(
    app: &TestApp,
    instructor: &TestUser,
    category_id: Uuid,
    price: i64,
) -> Uuid {
    let (course_id, section_id) = create_course(app, instructor, category_id, price).await;
    let lecture_id = create_lecture(app, instructor, course_id, section_id).await;
    mark_lecture_ready(app, instructor, course_id, section_id, lecture_id).await;

    let (status, body) = patch(
        app,
        &format!("/api/courses/{}/publish", course_id),
        Some(&instructor.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    course_id
}

pub async fn balance(app: &TestApp, user_id: Uuid) -> i64 {
    app.state
        .repos
        .users
        .find_by_id(user_id)
        .await
        .unwrap()
        .unwrap()
        .coins
}
