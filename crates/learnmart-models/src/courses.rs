//! Courses, their sections and lectures, and enrollments.

use chrono::{DateTime, Utc};
use learnmart_core::PaginationParams;
use learnmart_core::serde::{deserialize_optional_trimmed, deserialize_optional_uuid};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "course_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "course_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Draft,
    Published,
}

/// Lecture video pipeline state.
///
/// `pending` until a video key is attached, `processing` while the worker
/// transcodes it, then `ready` or `failed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "lecture_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LectureStatus {
    Pending,
    Processing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    /// Price in coins
    pub price: i64,
    pub thumbnail_key: Option<String>,
    pub level: CourseLevel,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: Uuid,
    pub course_id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub video_key: Option<String>,
    pub duration_seconds: Option<i32>,
    pub status: LectureStatus,
    pub is_preview: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A lecture as shown inside a course outline. `videoKey` is only present
/// when the viewer may watch it.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LectureView {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_key: Option<String>,
    pub duration_seconds: Option<i32>,
    pub status: LectureStatus,
    pub is_preview: bool,
    pub position: i32,
}

impl LectureView {
    pub fn from_lecture(lecture: Lecture, can_watch: bool) -> Self {
        let video_key = if can_watch || lecture.is_preview {
            lecture.video_key
        } else {
            None
        };

        Self {
            id: lecture.id,
            section_id: lecture.section_id,
            title: lecture.title,
            video_key,
            duration_seconds: lecture.duration_seconds,
            status: lecture.status,
            is_preview: lecture.is_preview,
            position: lecture.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionWithLectures {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub lectures: Vec<LectureView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub is_enrolled: bool,
    pub sections: Vec<SectionWithLectures>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(range(min = 0, message = "price must not be negative"))]
    pub price: i64,
    pub category_id: Uuid,
    pub level: CourseLevel,
    pub thumbnail_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "price must not be negative"))]
    pub price: Option<i64>,
    pub category_id: Option<Uuid>,
    pub level: Option<CourseLevel>,
    pub thumbnail_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub category_id: Option<Uuid>,
    pub level: Option<CourseLevel>,
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSectionDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(range(min = 0, message = "position must not be negative"))]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSectionDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(range(min = 0, message = "position must not be negative"))]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLectureDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    /// Storage key of an uploaded video. Starts processing when present.
    #[validate(length(min = 1, max = 512, message = "key must be between 1 and 512 characters"))]
    pub key: Option<String>,
    #[serde(default)]
    pub is_preview: bool,
    #[validate(range(min = 0, message = "durationSeconds must not be negative"))]
    pub duration_seconds: Option<i32>,
    #[validate(range(min = 0, message = "position must not be negative"))]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLectureDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 512, message = "key must be between 1 and 512 characters"))]
    pub key: Option<String>,
    pub is_preview: Option<bool>,
    #[validate(range(min = 0, message = "durationSeconds must not be negative"))]
    pub duration_seconds: Option<i32>,
    #[validate(range(min = 0, message = "position must not be negative"))]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    pub enrollment_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub course: Course,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture(is_preview: bool) -> Lecture {
        let now = Utc::now();
        Lecture {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            section_id: Uuid::new_v4(),
            title: "Intro".to_string(),
            video_key: Some("videos/intro.mp4".to_string()),
            duration_seconds: Some(120),
            status: LectureStatus::Ready,
            is_preview,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lecture_view_hides_key_for_outsiders() {
        let view = LectureView::from_lecture(lecture(false), false);
        assert!(view.video_key.is_none());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("videoKey").is_none());
    }

    #[test]
    fn test_lecture_view_shows_preview_key() {
        let view = LectureView::from_lecture(lecture(true), false);
        assert_eq!(view.video_key.as_deref(), Some("videos/intro.mp4"));
    }

    #[test]
    fn test_lecture_view_shows_key_to_enrolled() {
        let view = LectureView::from_lecture(lecture(false), true);
        assert!(view.video_key.is_some());
    }

    #[test]
    fn test_course_filter_coerces_query_strings() {
        let params: CourseFilterParams =
            serde_json::from_str(r#"{"level":"beginner","page":"0","limit":"500","search":"  "}"#)
                .unwrap();
        assert_eq!(params.level, Some(CourseLevel::Beginner));
        assert_eq!(params.pagination.page(), 1);
        assert_eq!(params.pagination.limit(), 100);
        assert!(params.search.is_none());
    }
}
