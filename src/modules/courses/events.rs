use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use learnmart_cache::{RedisCache, run_subscriber};
use learnmart_observability::track_lecture_event;
use learnmart_models::{
    LECTURE_EVENTS_CHANNEL, LectureEvent, LectureEventKind, LectureStatus, NotificationKind,
};

use crate::modules::notifications::NotificationService;
use crate::state::AppState;

/// Applies one message from the lecture-events channel.
///
/// Malformed payloads, unknown event names and events that do not match a
/// lecture awaiting processing are logged and dropped. The outcome is always
/// reported to the course instructor, whatever `userId` the event carries.
pub async fn handle_lecture_event(state: &AppState, payload: &str) {
    let event: LectureEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Ignoring unrecognized lecture event");
            return;
        }
    };

    track_lecture_event(match event.event {
        LectureEventKind::Uploaded => "uploaded",
        LectureEventKind::Processed => "processed",
        LectureEventKind::Failed => "failed",
    });

    let status = match event.event {
        // Our own announcement echoed back by the broker
        LectureEventKind::Uploaded => {
            debug!(lecture_id = %event.data.lecture_id, "Skipping lecture.uploaded");
            return;
        }
        LectureEventKind::Processed => LectureStatus::Ready,
        LectureEventKind::Failed => LectureStatus::Failed,
    };

    let data = event.data;
    let mut lecture = match state.repos.lectures.find_by_id(data.lecture_id).await {
        Ok(Some(lecture)) => lecture,
        Ok(None) => {
            warn!(lecture_id = %data.lecture_id, "Lecture event for unknown lecture");
            return;
        }
        Err(e) => {
            warn!(lecture_id = %data.lecture_id, error = %e, "Failed to load lecture");
            return;
        }
    };

    // Only the upload currently in flight for this exact lecture may settle it
    if lecture.course_id != data.course_id || lecture.section_id != data.section_id {
        warn!(
            lecture_id = %lecture.id,
            course_id = %data.course_id,
            section_id = %data.section_id,
            "Lecture event does not match the lecture's course or section"
        );
        return;
    }
    if lecture.status != LectureStatus::Processing {
        debug!(lecture_id = %lecture.id, status = ?lecture.status, "Ignoring stale lecture event");
        return;
    }

    let instructor_id = match state.repos.courses.find_by_id(lecture.course_id).await {
        Ok(Some(course)) => course.instructor_id,
        Ok(None) => {
            warn!(course_id = %lecture.course_id, "Lecture event for missing course");
            return;
        }
        Err(e) => {
            warn!(course_id = %lecture.course_id, error = %e, "Failed to load course");
            return;
        }
    };

    lecture.status = status;
    if status == LectureStatus::Ready {
        lecture.video_key = Some(data.key);
        if data.duration_seconds.is_some() {
            lecture.duration_seconds = data.duration_seconds;
        }
    }
    lecture.updated_at = Utc::now();

    if let Err(e) = state.repos.lectures.update(&lecture).await {
        warn!(lecture_id = %lecture.id, error = %e, "Failed to update lecture status");
        return;
    }

    let (title, message) = match status {
        LectureStatus::Ready => (
            "Lecture ready",
            format!("\"{}\" has been processed and is ready to watch", lecture.title),
        ),
        _ => (
            "Lecture processing failed",
            format!("\"{}\" could not be processed, please upload it again", lecture.title),
        ),
    };
    NotificationService::notify(state, instructor_id, NotificationKind::Lecture, title, message)
        .await;

    info!(lecture_id = %lecture.id, status = ?status, "Lecture status updated");
}

/// Starts the background subscriber on the lecture-events channel.
pub fn spawn_lecture_event_consumer(state: AppState, cache: &RedisCache) -> JoinHandle<()> {
    let client = cache.client().clone();
    let reconnect_delay = cache.reconnect_delay();
    tokio::spawn(async move {
        run_subscriber(
            client,
            LECTURE_EVENTS_CHANNEL.to_string(),
            reconnect_delay,
            move |payload: String| {
                let state = state.clone();
                async move { handle_lecture_event(&state, &payload).await }
            },
        )
        .await;
    })
}
