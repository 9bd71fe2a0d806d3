use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{ApiResponse, AppError, ErrorResponse, MessageData, Paginated, PaginationParams};
use learnmart_models::{
    Course, CourseDetail, CourseFilterParams, CreateCourseDto, CreateLectureDto, CreateSectionDto,
    EnrolledCourse, Enrollment, Lecture, Section, UpdateCourseDto, UpdateLectureDto,
    UpdateSectionDto,
};

use super::service::CourseService;
use crate::middleware::auth::{AuthUser, MaybeAuthUser, RequireInstructor};
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Published courses", body = [Course])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    ValidatedQuery(filters): ValidatedQuery<CourseFilterParams>,
) -> Result<ApiResponse<Paginated<Course>>, AppError> {
    let courses = CourseService::list_published(&state, filters).await?;
    Ok(ApiResponse::ok("Courses fetched successfully", courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/mine",
    params(PaginationParams),
    responses(
        (status = 200, description = "Courses taught by the caller", body = [Course]),
        (status = 403, description = "Instructor role required", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_my_courses(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    ValidatedQuery(pagination): ValidatedQuery<PaginationParams>,
) -> Result<ApiResponse<Paginated<Course>>, AppError> {
    let courses = CourseService::list_mine(&state, auth_user.user_id(), pagination).await?;
    Ok(ApiResponse::ok("Courses fetched successfully", courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/enrolled",
    params(PaginationParams),
    responses(
        (status = 200, description = "Courses the caller is enrolled in", body = [EnrolledCourse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_enrolled_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedQuery(pagination): ValidatedQuery<PaginationParams>,
) -> Result<ApiResponse<Paginated<EnrolledCourse>>, AppError> {
    let courses = CourseService::list_enrolled(&state, auth_user.user_id(), pagination).await?;
    Ok(ApiResponse::ok("Enrolled courses fetched successfully", courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with its outline", body = CourseDetail),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CourseDetail>, AppError> {
    let course = CourseService::get_detail(&state, id, viewer.as_ref()).await?;
    Ok(ApiResponse::ok("Course fetched successfully", course))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<ApiResponse<Course>, AppError> {
    let course = CourseService::create_course(&state, auth_user.user_id(), dto).await?;
    Ok(ApiResponse::created("Course created successfully", course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the course instructor", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_course(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<ApiResponse<Course>, AppError> {
    let course = CourseService::update_course(&state, &auth_user, id, dto).await?;
    Ok(ApiResponse::ok("Course updated successfully", course))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted", body = MessageData),
        (status = 400, description = "Course has enrolled students", body = ErrorResponse),
        (status = 403, description = "Not the course instructor", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<MessageData>, AppError> {
    CourseService::delete_course(&state, &auth_user, id).await?;
    Ok(ApiResponse::ok(
        "Course deleted successfully",
        MessageData::new("Course deleted successfully"),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/courses/{id}/publish",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course published", body = Course),
        (status = 400, description = "No ready lecture", body = ErrorResponse),
        (status = 403, description = "Not the course instructor", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn publish_course(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Course>, AppError> {
    let course = CourseService::publish_course(&state, &auth_user, id).await?;
    Ok(ApiResponse::ok("Course published successfully", course))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 400, description = "Not enrollable or insufficient coins", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn enroll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Enrollment>, AppError> {
    let enrollment = CourseService::enroll(&state, &auth_user, id).await?;
    Ok(ApiResponse::created("Enrolled successfully", enrollment))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/sections",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateSectionDto,
    responses(
        (status = 201, description = "Section created", body = Section),
        (status = 403, description = "Not the course instructor", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_section(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateSectionDto>,
) -> Result<ApiResponse<Section>, AppError> {
    let section = CourseService::create_section(&state, &auth_user, id, dto).await?;
    Ok(ApiResponse::created("Section created successfully", section))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/sections/{section_id}",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    request_body = UpdateSectionDto,
    responses(
        (status = 200, description = "Section updated", body = Section),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_section(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path((id, section_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(dto): ValidatedJson<UpdateSectionDto>,
) -> Result<ApiResponse<Section>, AppError> {
    let section = CourseService::update_section(&state, &auth_user, id, section_id, dto).await?;
    Ok(ApiResponse::ok("Section updated successfully", section))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/sections/{section_id}",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    responses(
        (status = 200, description = "Section deleted", body = MessageData),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_section(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path((id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<MessageData>, AppError> {
    CourseService::delete_section(&state, &auth_user, id, section_id).await?;
    Ok(ApiResponse::ok(
        "Section deleted successfully",
        MessageData::new("Section deleted successfully"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/sections/{section_id}/lectures",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    request_body = CreateLectureDto,
    responses(
        (status = 201, description = "Lecture created", body = Lecture),
        (status = 400, description = "Invalid storage key", body = ErrorResponse),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_lecture(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path((id, section_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(dto): ValidatedJson<CreateLectureDto>,
) -> Result<ApiResponse<Lecture>, AppError> {
    let lecture = CourseService::create_lecture(&state, &auth_user, id, section_id, dto).await?;
    Ok(ApiResponse::created("Lecture created successfully", lecture))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/sections/{section_id}/lectures/{lecture_id}",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("section_id" = Uuid, Path, description = "Section ID"),
        ("lecture_id" = Uuid, Path, description = "Lecture ID")
    ),
    request_body = UpdateLectureDto,
    responses(
        (status = 200, description = "Lecture updated", body = Lecture),
        (status = 404, description = "Lecture not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_lecture(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path((id, section_id, lecture_id)): Path<(Uuid, Uuid, Uuid)>,
    ValidatedJson(dto): ValidatedJson<UpdateLectureDto>,
) -> Result<ApiResponse<Lecture>, AppError> {
    let lecture =
        CourseService::update_lecture(&state, &auth_user, id, section_id, lecture_id, dto).await?;
    Ok(ApiResponse::ok("Lecture updated successfully", lecture))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/sections/{section_id}/lectures/{lecture_id}",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("section_id" = Uuid, Path, description = "Section ID"),
        ("lecture_id" = Uuid, Path, description = "Lecture ID")
    ),
    responses(
        (status = 200, description = "Lecture deleted", body = MessageData),
        (status = 404, description = "Lecture not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_lecture(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path((id, section_id, lecture_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<ApiResponse<MessageData>, AppError> {
    CourseService::delete_lecture(&state, &auth_user, id, section_id, lecture_id).await?;
    Ok(ApiResponse::ok(
        "Lecture deleted successfully",
        MessageData::new("Lecture deleted successfully"),
    ))
}
