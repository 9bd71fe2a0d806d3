mod common;

use axum::http::{Method, StatusCode};
use common::{
    balance, create_category, create_course, create_lecture, create_published_course,
    create_test_user, get, mark_lecture_ready, patch, post, send, upload_key,
};
use learnmart::learnmart_models::{LECTURE_EVENTS_CHANNEL, LectureStatus, UserRole};
use learnmart::modules::courses::events::handle_lecture_event;
use learnmart::testing::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_students_cannot_create_courses() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;
    let category = create_category(&app, &admin, "Programming").await;

    let (status, _) = post(
        &app,
        "/api/courses",
        Some(&student.token),
        json!({
            "title": "Nope",
            "description": "Nope",
            "price": 0,
            "categoryId": category,
            "level": "beginner"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_course_with_unknown_category() {
    let app = TestApp::new();
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;

    let (status, body) = post(
        &app,
        "/api/courses",
        Some(&instructor.token),
        json!({
            "title": "Orphan",
            "description": "No category",
            "price": 10,
            "categoryId": uuid::Uuid::new_v4(),
            "level": "advanced"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Category not found");
}

#[tokio::test]
async fn test_negative_price_rejected() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;

    let (status, _) = post(
        &app,
        "/api/courses",
        Some(&instructor.token),
        json!({
            "title": "Free money",
            "description": "Negative price",
            "price": -5,
            "categoryId": category,
            "level": "beginner"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_lecture_upload_is_announced() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, section_id) = create_course(&app, &instructor, category, 0).await;

    let lecture_id = create_lecture(&app, &instructor, course_id, section_id).await;

    let published = app.publisher.published();
    assert_eq!(published.len(), 1);
    let (channel, payload) = &published[0];
    assert_eq!(channel, LECTURE_EVENTS_CHANNEL);

    let event: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(event["event"], "lecture.uploaded");
    assert_eq!(event["data"]["lectureId"], lecture_id.to_string());
    assert_eq!(event["data"]["courseId"], course_id.to_string());
    assert_eq!(event["data"]["key"], upload_key(&instructor, "videos/hello.mp4"));

    let lecture = app
        .state
        .repos
        .lectures
        .find_by_id(lecture_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lecture.status, LectureStatus::Processing);
}

#[tokio::test]
async fn test_lecture_key_with_traversal_rejected() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, section_id) = create_course(&app, &instructor, category, 0).await;

    let (status, _) = post(
        &app,
        &format!("/api/courses/{}/sections/{}/lectures", course_id, section_id),
        Some(&instructor.token),
        json!({ "title": "Sneaky", "key": "../secrets.mp4" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.publisher.published().is_empty());
}

#[tokio::test]
async fn test_lecture_key_must_be_instructor_upload() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let other = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, section_id) = create_course(&app, &instructor, category, 0).await;
    let uri = format!("/api/courses/{}/sections/{}/lectures", course_id, section_id);

    for key in ["videos/hello.mp4".to_string(), upload_key(&other, "videos/hello.mp4")] {
        let (status, body) = post(
            &app,
            &uri,
            Some(&instructor.token),
            json!({ "title": "Borrowed", "key": key }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "key");
    }
    assert!(app.publisher.published().is_empty());

    // Admins editing the course still attach the instructor's uploads
    let (status, _) = post(
        &app,
        &uri,
        Some(&admin.token),
        json!({ "title": "Intro", "key": upload_key(&instructor, "videos/intro.mp4") }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_update_course_sections_and_lectures() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let other = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, section_id) = create_course(&app, &instructor, category, 0).await;
    let lecture_id = create_lecture(&app, &instructor, course_id, section_id).await;
    let course_uri = format!("/api/courses/{}", course_id);
    let section_uri = format!("{}/sections/{}", course_uri, section_id);
    let lecture_uri = format!("{}/lectures/{}", section_uri, lecture_id);

    let (status, _) = send(
        &app,
        Method::PUT,
        &course_uri,
        Some(&other.token),
        Some(json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let thumbnail = upload_key(&instructor, "images/cover.png");
    let (status, body) = send(
        &app,
        Method::PUT,
        &course_uri,
        Some(&instructor.token),
        Some(json!({ "title": "  Advanced Rust ", "price": 25, "thumbnailKey": thumbnail })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Advanced Rust");
    assert_eq!(body["data"]["price"], 25);
    assert_eq!(body["data"]["thumbnailKey"], thumbnail);

    let (status, body) = send(
        &app,
        Method::PUT,
        &section_uri,
        Some(&instructor.token),
        Some(json!({ "title": "Getting started", "position": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Getting started");
    assert_eq!(body["data"]["position"], 2);

    // A rename leaves processing alone
    let (status, body) = send(
        &app,
        Method::PUT,
        &lecture_uri,
        Some(&instructor.token),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(app.publisher.published().len(), 1);

    mark_lecture_ready(&app, &instructor, course_id, section_id, lecture_id).await;

    // A new video goes back through processing and is announced again
    let new_key = upload_key(&instructor, "videos/hello-v2.mp4");
    let (status, body) = send(
        &app,
        Method::PUT,
        &lecture_uri,
        Some(&instructor.token),
        Some(json!({ "key": new_key })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "processing");
    let published = app.publisher.published();
    assert_eq!(published.len(), 2);
    let event: serde_json::Value = serde_json::from_str(&published[1].1).unwrap();
    assert_eq!(event["event"], "lecture.uploaded");
    assert_eq!(event["data"]["key"], new_key);

    let (status, _) = send(&app, Method::DELETE, &lecture_uri, Some(&instructor.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.repos.lectures.find_by_id(lecture_id).await.unwrap().is_none());

    let (status, _) = send(&app, Method::DELETE, &section_uri, Some(&other.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &section_uri, Some(&instructor.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &section_uri, Some(&instructor.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, &course_uri, Some(&instructor.token)).await;
    assert!(body["data"]["sections"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_requires_ready_lecture() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, section_id) = create_course(&app, &instructor, category, 0).await;
    let lecture_id = create_lecture(&app, &instructor, course_id, section_id).await;

    let publish_uri = format!("/api/courses/{}/publish", course_id);
    let (status, _) = patch(&app, &publish_uri, Some(&instructor.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    mark_lecture_ready(&app, &instructor, course_id, section_id, lecture_id).await;

    let (status, body) = patch(&app, &publish_uri, Some(&instructor.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "published");

    // The worker's notification reached the instructor
    let (_, body) = get(&app, "/api/notifications", Some(&instructor.token)).await;
    assert_eq!(body["data"]["items"][0]["kind"], "lecture");
}

#[tokio::test]
async fn test_only_owner_can_publish() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let owner = create_test_user(&app, UserRole::Instructor, 0).await;
    let other = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, _) = create_course(&app, &owner, category, 0).await;

    let (status, _) = patch(
        &app,
        &format!("/api/courses/{}/publish", course_id),
        Some(&other.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_failed_and_malformed_lecture_events() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, section_id) = create_course(&app, &instructor, category, 0).await;
    let lecture_id = create_lecture(&app, &instructor, course_id, section_id).await;

    handle_lecture_event(&app.state, "not json").await;
    handle_lecture_event(&app.state, r#"{"event":"lecture.deleted","data":{}}"#).await;

    let failed = json!({
        "event": "lecture.failed",
        "data": {
            "userId": instructor.id,
            "courseId": course_id,
            "sectionId": section_id,
            "lectureId": lecture_id,
            "key": "videos/hello.mp4"
        }
    });
    handle_lecture_event(&app.state, &failed.to_string()).await;

    let lecture = app
        .state
        .repos
        .lectures
        .find_by_id(lecture_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lecture.status, LectureStatus::Failed);
}

#[tokio::test]
async fn test_lecture_events_must_match_the_pending_upload() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let stranger = create_test_user(&app, UserRole::Student, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, section_id) = create_course(&app, &instructor, category, 0).await;
    let lecture_id = create_lecture(&app, &instructor, course_id, section_id).await;

    // Right lecture id, wrong course and section: dropped
    let forged = json!({
        "event": "lecture.failed",
        "data": {
            "userId": stranger.id,
            "courseId": Uuid::new_v4(),
            "sectionId": Uuid::new_v4(),
            "lectureId": lecture_id,
            "key": "videos/hello.mp4"
        }
    });
    handle_lecture_event(&app.state, &forged.to_string()).await;
    let lecture = app.state.repos.lectures.find_by_id(lecture_id).await.unwrap().unwrap();
    assert_eq!(lecture.status, LectureStatus::Processing);

    // The outcome goes to the instructor, not to whoever the event names
    let processed = json!({
        "event": "lecture.processed",
        "data": {
            "userId": stranger.id,
            "courseId": course_id,
            "sectionId": section_id,
            "lectureId": lecture_id,
            "key": "videos/hello-720p.mp4",
            "durationSeconds": 120
        }
    });
    handle_lecture_event(&app.state, &processed.to_string()).await;
    let lecture = app.state.repos.lectures.find_by_id(lecture_id).await.unwrap().unwrap();
    assert_eq!(lecture.status, LectureStatus::Ready);
    assert_eq!(app.state.repos.notifications.unread_count(stranger.id).await.unwrap(), 0);
    assert_eq!(app.state.repos.notifications.unread_count(instructor.id).await.unwrap(), 1);

    // A late failure for the finished upload does not undo it
    let stale = json!({
        "event": "lecture.failed",
        "data": {
            "userId": instructor.id,
            "courseId": course_id,
            "sectionId": section_id,
            "lectureId": lecture_id,
            "key": "videos/hello.mp4"
        }
    });
    handle_lecture_event(&app.state, &stale.to_string()).await;
    let lecture = app.state.repos.lectures.find_by_id(lecture_id).await.unwrap().unwrap();
    assert_eq!(lecture.status, LectureStatus::Ready);
    assert_eq!(lecture.duration_seconds, Some(120));
    assert_eq!(app.state.repos.notifications.unread_count(instructor.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_drafts_hidden_from_public() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, _) = create_course(&app, &instructor, category, 0).await;
    let uri = format!("/api/courses/{}", course_id);

    let (status, _) = get(&app, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, &uri, Some(&instructor.token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/api/courses", None).await;
    assert_eq!(body["data"]["meta"]["total"], 0);

    let (_, body) = get(&app, "/api/courses/mine", Some(&instructor.token)).await;
    assert_eq!(body["data"]["meta"]["total"], 1);
}

#[tokio::test]
async fn test_paid_enrollment_moves_coins() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let student = create_test_user(&app, UserRole::Student, 100).await;
    let category = create_category(&app, &admin, "Programming").await;
    let course_id = create_published_course(&app, &instructor, category, 40).await;

    let (status, _) = post(
        &app,
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(balance(&app, student.id).await, 60);
    assert_eq!(balance(&app, instructor.id).await, 40);

    let (_, body) = get(
        &app,
        "/api/payments/transactions?type=debit&purchaseType=course",
        Some(&student.token),
    )
    .await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["coins"], 40);
    assert_eq!(body["data"]["items"][0]["referenceId"], course_id.to_string());

    let (_, body) = get(&app, "/api/courses/enrolled", Some(&student.token)).await;
    assert_eq!(body["data"]["items"][0]["course"]["id"], course_id.to_string());

    let (_, body) = get(&app, "/api/notifications", Some(&instructor.token)).await;
    assert!(
        body["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["kind"] == "enrollment")
    );
}

#[tokio::test]
async fn test_enrollment_rules() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let rich = create_test_user(&app, UserRole::Student, 100).await;
    let poor = create_test_user(&app, UserRole::Student, 5).await;
    let category = create_category(&app, &admin, "Programming").await;
    let course_id = create_published_course(&app, &instructor, category, 50).await;
    let enroll_uri = format!("/api/courses/{}/enroll", course_id);

    let (status, body) = post(&app, &enroll_uri, Some(&poor.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient coin balance");
    assert_eq!(balance(&app, poor.id).await, 5);

    let (status, _) = post(&app, &enroll_uri, Some(&instructor.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, &enroll_uri, Some(&rich.token), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = post(&app, &enroll_uri, Some(&rich.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You are already enrolled in this course");
    assert_eq!(balance(&app, rich.id).await, 50);
}

#[tokio::test]
async fn test_cannot_enroll_in_draft() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let student = create_test_user(&app, UserRole::Student, 100).await;
    let category = create_category(&app, &admin, "Programming").await;
    let (course_id, _) = create_course(&app, &instructor, category, 0).await;

    let (status, body) = post(
        &app,
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Course is not published");
}

#[tokio::test]
async fn test_video_keys_hidden_until_enrolled() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let course_id = create_published_course(&app, &instructor, category, 0).await;

    let (_, body) = get(&app, &format!("/api/courses/{}", course_id), None).await;
    let section_id = body["data"]["sections"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        &format!("/api/courses/{}/sections/{}/lectures", course_id, section_id),
        Some(&instructor.token),
        json!({ "title": "Members only", "key": upload_key(&instructor, "videos/private.mp4") }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let private_id = body["data"]["id"].as_str().unwrap().to_string();

    let find_private = |body: &serde_json::Value| {
        body["data"]["sections"][0]["lectures"]
            .as_array()
            .unwrap()
            .iter()
            .find(|l| l["id"] == private_id.as_str())
            .cloned()
            .unwrap()
    };

    let (_, body) = get(&app, &format!("/api/courses/{}", course_id), Some(&student.token)).await;
    assert_eq!(body["data"]["isEnrolled"], false);
    assert!(find_private(&body).get("videoKey").is_none());

    post(
        &app,
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student.token),
        json!({}),
    )
    .await;

    let (_, body) = get(&app, &format!("/api/courses/{}", course_id), Some(&student.token)).await;
    assert_eq!(body["data"]["isEnrolled"], true);
    assert_eq!(
        find_private(&body)["videoKey"],
        upload_key(&instructor, "videos/private.mp4")
    );
}

#[tokio::test]
async fn test_course_with_enrollments_cannot_be_deleted() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let student = create_test_user(&app, UserRole::Student, 0).await;
    let category = create_category(&app, &admin, "Programming").await;
    let course_id = create_published_course(&app, &instructor, category, 0).await;
    post(
        &app,
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student.token),
        json!({}),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/courses/{}", course_id),
        Some(&instructor.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_published_filters() {
    let app = TestApp::new();
    let admin = create_test_user(&app, UserRole::Admin, 0).await;
    let instructor = create_test_user(&app, UserRole::Instructor, 0).await;
    let programming = create_category(&app, &admin, "Programming").await;
    let cooking = create_category(&app, &admin, "Cooking").await;
    create_published_course(&app, &instructor, programming, 0).await;
    create_published_course(&app, &instructor, cooking, 10).await;

    let (_, body) = get(&app, "/api/courses", None).await;
    assert_eq!(body["data"]["meta"]["total"], 2);

    let (_, body) = get(&app, &format!("/api/courses?categoryId={}", cooking), None).await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["categoryId"], cooking.to_string());

    let (_, body) = get(&app, "/api/courses?search=RUST", None).await;
    assert_eq!(body["data"]["meta"]["total"], 2);

    let (status, _) = get(&app, "/api/courses?level=expert", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
