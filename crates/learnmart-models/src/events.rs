//! Lecture processing events.
//!
//! The API publishes `lecture.uploaded` when a lecture gets a video key. An
//! external transcoding worker answers on the same channel with
//! `lecture.processed` or `lecture.failed`.
//!
//! ```json
//! { "event": "lecture.uploaded",
//!   "data": { "userId": "...", "courseId": "...", "sectionId": "...", "lectureId": "...", "key": "videos/a.mp4" } }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const LECTURE_EVENTS_CHANNEL: &str = "lecture-events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LectureEventKind {
    #[serde(rename = "lecture.uploaded")]
    Uploaded,
    #[serde(rename = "lecture.processed")]
    Processed,
    #[serde(rename = "lecture.failed")]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureEventData {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub section_id: Uuid,
    pub lecture_id: Uuid,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureEvent {
    pub event: LectureEventKind,
    pub data: LectureEventData,
}

impl LectureEvent {
    pub fn uploaded(data: LectureEventData) -> Self {
        Self {
            event: LectureEventKind::Uploaded,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_event_wire_shape() {
        let data = LectureEventData {
            user_id: Uuid::nil(),
            course_id: Uuid::nil(),
            section_id: Uuid::nil(),
            lecture_id: Uuid::nil(),
            key: "videos/a.mp4".to_string(),
            duration_seconds: None,
        };
        let json = serde_json::to_value(LectureEvent::uploaded(data)).unwrap();

        assert_eq!(json["event"], "lecture.uploaded");
        assert_eq!(json["data"]["key"], "videos/a.mp4");
        assert!(json["data"].get("lectureId").is_some());
        assert!(json["data"].get("durationSeconds").is_none());
    }

    #[test]
    fn test_unknown_event_fails_to_parse() {
        let raw = r#"{"event":"lecture.deleted","data":{}}"#;
        assert!(serde_json::from_str::<LectureEvent>(raw).is_err());
    }
}
