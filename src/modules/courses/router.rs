use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::state::AppState;

use super::controller::{
    create_course, create_lecture, create_section, delete_course, delete_lecture, delete_section,
    enroll, get_course, list_courses, list_enrolled_courses, list_my_courses, publish_course,
    update_course, update_lecture, update_section,
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/mine", get(list_my_courses))
        .route("/enrolled", get(list_enrolled_courses))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{id}/publish", patch(publish_course))
        .route("/{id}/enroll", post(enroll))
        .route("/{id}/sections", post(create_section))
        .route(
            "/{id}/sections/{section_id}",
            put(update_section).delete(delete_section),
        )
        .route("/{id}/sections/{section_id}/lectures", post(create_lecture))
        .route(
            "/{id}/sections/{section_id}/lectures/{lecture_id}",
            put(update_lecture).delete(delete_lecture),
        )
}
