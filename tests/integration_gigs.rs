mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{TestUser, balance, create_test_user, get, patch, post};
use learnmart::learnmart_models::UserRole;
use learnmart::testing::TestApp;
use serde_json::json;
use uuid::Uuid;

async fn create_gig(app: &TestApp, admin: &TestUser, min_bid: i64) -> Uuid {
    let now = Utc::now();
    let (status, body) = post(
        app,
        "/api/gigs",
        Some(&admin.token),
        json!({
            "title": "Record a Rust workshop",
            "description": "Two hours on async Rust",
            "minBid": min_bid,
            "startsAt": now - Duration::minutes(1),
            "endsAt": now + Duration::hours(1)
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "open");
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

async fn bid(app: &TestApp, bidder: &TestUser, gig_id: Uuid, amount: i64) -> (StatusCode, serde_json::Value) {
    post(
        app,
        &format!("/api/gigs/{}/bids", gig_id),
        Some(&bidder.token),
        json!({ "amount": amount, "message": "Pick me" }),
    )
    .await
}

#[tokio::test]
async fn test_only_admin_creates_gigs() {
    let app = TestApp::new();
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let now = Utc::now();

    let (status, _) = post(
        &app,
        "/api/gigs",
        Some(&instructor.token),
        json!({
            "title": "Mine",
            "description": "Mine",
            "minBid": 1,
            "startsAt": now,
            "endsAt": now + Duration::hours(1)
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_gig_window_must_be_valid() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let now = Utc::now();

    let (status, _) = post(
        &app,
        "/api/gigs",
        Some(&admin.token),
        json!({
            "title": "Backwards",
            "description": "Ends before it starts",
            "minBid": 1,
            "startsAt": now + Duration::hours(2),
            "endsAt": now + Duration::hours(1)
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post(
        &app,
        "/api/gigs",
        Some(&admin.token),
        json!({
            "title": "Already over",
            "description": "Ended yesterday",
            "minBid": 1,
            "startsAt": now - Duration::days(2),
            "endsAt": now - Duration::days(1)
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "endsAt must be in the future");
}

#[tokio::test]
async fn test_bidding_rules() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let alice = create_test_user(&app, UserRole::Instructor, 500).await;
    let bob = create_test_user(&app, UserRole::Instructor, 30).await;
    let student = create_test_user(&app, UserRole::Student, 500).await;
    let gig_id = create_gig(&app, &admin, 20).await;

    let (status, _) = bid(&app, &student, gig_id, 100).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = bid(&app, &alice, gig_id, 10).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Bid must be at least 20 coins");

    let (status, _) = bid(&app, &alice, gig_id, 25).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = bid(&app, &bob, gig_id, 25).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Bid must be higher than the current highest bid");

    let (status, body) = bid(&app, &bob, gig_id, 40).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient coin balance");

    // Bidding does not reserve coins
    assert_eq!(balance(&app, alice.id).await, 500);

    let (_, body) = get(&app, &format!("/api/gigs/{}", gig_id), Some(&alice.token)).await;
    assert_eq!(body["data"]["bidCount"], 1);
    assert_eq!(body["data"]["highestBid"], 25);
}

#[tokio::test]
async fn test_outbid_instructor_is_notified() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let alice = create_test_user(&app, UserRole::Instructor, 500).await;
    let bob = create_test_user(&app, UserRole::Instructor, 500).await;
    let gig_id = create_gig(&app, &admin, 10).await;

    bid(&app, &alice, gig_id, 50).await;
    // Raising your own bid sends nothing
    bid(&app, &alice, gig_id, 60).await;
    let (_, body) = get(&app, "/api/notifications/unread-count", Some(&alice.token)).await;
    assert_eq!(body["data"]["count"], 0);

    let (status, _) = bid(&app, &bob, gig_id, 70).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = get(&app, "/api/notifications", Some(&alice.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["kind"], "bid");
    assert_eq!(body["data"]["items"][0]["isRead"], false);
}

#[tokio::test]
async fn test_bids_rejected_outside_window() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let alice = create_test_user(&app, UserRole::Instructor, 500).await;
    let gig_id = create_gig(&app, &admin, 10).await;
    let now = Utc::now();

    app.store
        .set_gig_window(gig_id, now + Duration::hours(1), now + Duration::hours(2))
        .unwrap();
    let (status, body) = bid(&app, &alice, gig_id, 20).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Gig has not started yet");

    app.store
        .set_gig_window(gig_id, now - Duration::hours(2), now - Duration::hours(1))
        .unwrap();
    let (status, body) = bid(&app, &alice, gig_id, 20).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Gig has expired");
}

#[tokio::test]
async fn test_close_charges_highest_solvent_bidder() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let alice = create_test_user(&app, UserRole::Instructor, 500).await;
    let bob = create_test_user(&app, UserRole::Instructor, 500).await;
    let gig_id = create_gig(&app, &admin, 10).await;

    bid(&app, &alice, gig_id, 100).await;
    let (_, body) = bid(&app, &bob, gig_id, 200).await;
    let bob_bid = body["data"]["id"].as_str().unwrap().to_string();

    // Bob spends his coins elsewhere before the gig closes
    app.store.set_coins(bob.id, 50).unwrap();

    let (status, body) = patch(
        &app,
        &format!("/api/gigs/{}/close", gig_id),
        Some(&admin.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");
    assert_ne!(body["data"]["winningBidId"], bob_bid.as_str());

    assert_eq!(balance(&app, alice.id).await, 400);
    assert_eq!(balance(&app, bob.id).await, 50);

    let (_, body) = get(
        &app,
        "/api/payments/transactions?type=debit&purchaseType=gig",
        Some(&alice.token),
    )
    .await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["referenceId"], gig_id.to_string());

    let (_, body) = get(&app, "/api/notifications", Some(&alice.token)).await;
    assert!(
        body["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["kind"] == "gig")
    );

    let (status, body) = patch(
        &app,
        &format!("/api/gigs/{}/close", gig_id),
        Some(&admin.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Gig is already closed");

    let (status, _) = bid(&app, &bob, gig_id, 300).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_close_without_bids() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let gig_id = create_gig(&app, &admin, 10).await;

    let (status, body) = patch(
        &app,
        &format!("/api/gigs/{}/close", gig_id),
        Some(&admin.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["winningBidId"].is_null());
}

#[tokio::test]
async fn test_list_bids_and_my_bids() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let alice = create_test_user(&app, UserRole::Instructor, 500).await;
    let bob = create_test_user(&app, UserRole::Instructor, 500).await;
    let first = create_gig(&app, &admin, 10).await;
    let second = create_gig(&app, &admin, 10).await;

    bid(&app, &alice, first, 20).await;
    bid(&app, &bob, first, 30).await;
    bid(&app, &alice, second, 15).await;

    let (_, body) = get(&app, &format!("/api/gigs/{}/bids", first), Some(&admin.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["amount"], 30);

    let (_, body) = get(&app, "/api/gigs/bids/mine", Some(&alice.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 2);

    let (status, _) = get(
        &app,
        &format!("/api/gigs/{}/bids", Uuid::new_v4()),
        Some(&admin.token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, "/api/gigs?status=open", Some(&alice.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 2);
}
