mod common;

use axum::http::StatusCode;
use common::get;
use learnmart::testing::TestApp;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let (status, body) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = TestApp::new();

    let (status, body) = get(&app, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "LearnMart API");

    let paths = body["paths"].as_object().unwrap();
    for path in [
        "/api/auth/sign-up",
        "/api/courses/{id}/enroll",
        "/api/gigs/{id}/bids",
        "/api/payments/coins/purchase",
        "/api/files/signed-url",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new();
    let (status, _) = get(&app, "/api/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
