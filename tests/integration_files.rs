mod common;

use axum::http::StatusCode;
use common::{
    create_category, create_published_course, create_test_user, get, post, upload_key,
};
use learnmart::learnmart_models::UserRole;
use learnmart::testing::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_signed_upload_url_defaults_to_private_bucket() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Instructor, 0).await;

    let (status, body) = post(
        &app,
        "/api/files/signed-url",
        Some(&user.token),
        json!({ "key": "videos/intro.mp4", "contentType": "video/mp4" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let key = upload_key(&user, "videos/intro.mp4");
    assert_eq!(body["data"]["key"], key);
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with(&format!(
        "https://storage.learnmart.test/learnmart-private/{key}?"
    )));
    assert!(url.contains("X-Method=PUT"));
    assert!(url.contains("X-Signature="));
}

#[tokio::test]
async fn test_signed_upload_url_public_bucket() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;

    let (status, body) = post(
        &app,
        "/api/files/signed-url",
        Some(&user.token),
        json!({ "key": "avatars/me.png", "isPublic": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["data"]["url"]
            .as_str()
            .unwrap()
            .contains("/learnmart-public/")
    );
}

#[tokio::test]
async fn test_uploads_stay_in_own_namespace() {
    let app = TestApp::new();
    let victim = create_test_user(&app, UserRole::Instructor, 0).await;
    let attacker = create_test_user(&app, UserRole::Instructor, 0).await;
    let victim_key = upload_key(&victim, "videos/intro.mp4");

    let (status, body) = post(
        &app,
        "/api/files/signed-url",
        Some(&attacker.token),
        json!({ "key": victim_key }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = body["data"]["key"].as_str().unwrap();
    assert_ne!(key, victim_key);
    assert!(key.starts_with(&format!("users/{}/", attacker.id)));

    // Temp uploads keep the namespace behind the temp prefix
    let (_, body) = post(
        &app,
        "/api/files/signed-url",
        Some(&victim.token),
        json!({ "key": "drafts/cut.mp4", "isTemp": true }),
    )
    .await;
    assert_eq!(
        body["data"]["key"],
        format!("tmp/{}", upload_key(&victim, "drafts/cut.mp4"))
    );
}

#[tokio::test]
async fn test_signed_url_rejects_bad_keys() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;

    let (status, body) = post(
        &app,
        "/api/files/signed-url",
        Some(&user.token),
        json!({ "key": "videos/../../etc/passwd" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "key");

    let (status, _) = post(&app, "/api/files/signed-url", Some(&user.token), json!({ "key": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(
        &app,
        "/api/files/signed-url",
        None,
        json!({ "key": "videos/intro.mp4" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_download_url_for_own_upload() {
    let app = TestApp::new();
    let user = create_test_user(&app, UserRole::Student, 0).await;
    let key = upload_key(&user, "notes/week1.pdf");

    let (status, body) = get(
        &app,
        &format!("/api/files/download-url?key={key}"),
        Some(&user.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.contains(&format!("/learnmart-private/{key}")));
    assert!(url.contains("X-Method=GET"));

    let (status, _) = get(&app, "/api/files/download-url", Some(&user.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_private_lecture_download_requires_enrollment() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let course_id = create_published_course(&app, &instructor, category, 0).await;

    let (_, body) = get(&app, &format!("/api/courses/{}", course_id), None).await;
    let section_id = body["data"]["sections"][0]["id"].as_str().unwrap().to_string();
    let key = upload_key(&instructor, "videos/private.mp4");
    let (status, _) = post(
        &app,
        &format!("/api/courses/{}/sections/{}/lectures", course_id, section_id),
        Some(&instructor.token),
        json!({ "title": "Members only", "key": key }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/files/download-url?key={key}");
    let (status, body) = get(&app, &uri, Some(&student.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "error");

    // Arbitrary private keys are refused as well
    let (status, _) = get(
        &app,
        "/api/files/download-url?key=videos/intro.mp4",
        Some(&student.token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get(&app, &uri, Some(&instructor.token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &uri, Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);

    post(
        &app,
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student.token),
        json!({}),
    )
    .await;
    let (status, _) = get(&app, &uri, Some(&student.token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_preview_lecture_download_is_open() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    create_published_course(&app, &instructor, category, 10).await;

    // The processed preview lecture of a published course
    let (status, _) = get(
        &app,
        "/api/files/download-url?key=videos/hello-720p.mp4",
        Some(&student.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
