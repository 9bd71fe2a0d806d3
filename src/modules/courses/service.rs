use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use learnmart_core::storage::{is_owned_key, sanitize_key};
use learnmart_core::{AppError, FieldError, Paginated, PaginationParams, RepoError};
use learnmart_models::{
    Course, CourseDetail, CourseFilterParams, CourseStatus, CreateCourseDto, CreateLectureDto,
    CreateSectionDto, EnrolledCourse, Enrollment, LECTURE_EVENTS_CHANNEL, Lecture,
    LectureEvent, LectureEventData, LectureStatus, LectureView, NotificationKind, PurchaseType,
    Section, SectionWithLectures, Transaction, TransactionType, UpdateCourseDto,
    UpdateLectureDto, UpdateSectionDto,
};
use learnmart_observability::track_enrollment;

use crate::middleware::auth::AuthUser;
use crate::modules::notifications::NotificationService;
use crate::state::AppState;

pub struct CourseService;

impl CourseService {
    async fn find_course(state: &AppState, id: Uuid) -> Result<Course, AppError> {
        state
            .repos
            .courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))
    }

    fn can_manage(course: &Course, auth_user: &AuthUser) -> bool {
        auth_user.is_admin() || course.instructor_id == auth_user.user_id()
    }

    /// Sanitizes a storage key and requires it to sit in the instructor's
    /// upload namespace.
    fn instructor_key(instructor_id: Uuid, field: &str, raw: &str) -> Result<String, AppError> {
        let key = sanitize_key(raw)?;
        if !is_owned_key(instructor_id, &key) {
            return Err(AppError::malformed(vec![FieldError::new(
                field,
                "key must point to an upload made by the course instructor",
            )]));
        }
        Ok(key)
    }

    /// Loads the course and checks the caller owns it (admins pass too).
    async fn owned_course(
        state: &AppState,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<Course, AppError> {
        let course = Self::find_course(state, id).await?;
        if !Self::can_manage(&course, auth_user) {
            return Err(AppError::forbidden(
                "Only the course instructor can modify this course",
            ));
        }
        Ok(course)
    }

    async fn ensure_category(state: &AppState, category_id: Uuid) -> Result<(), AppError> {
        state
            .repos
            .categories
            .find_by_id(category_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Category not found"))
    }

    #[instrument(skip(state))]
    pub async fn list_published(
        state: &AppState,
        filters: CourseFilterParams,
    ) -> Result<Paginated<Course>, AppError> {
        let (courses, total) = state.repos.courses.list_published(&filters).await?;
        Ok(Paginated::new(courses, total, &filters.pagination))
    }

    #[instrument(skip(state))]
    pub async fn list_mine(
        state: &AppState,
        instructor_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<Paginated<Course>, AppError> {
        let (courses, total) = state
            .repos
            .courses
            .list_by_instructor(instructor_id, &pagination)
            .await?;
        Ok(Paginated::new(courses, total, &pagination))
    }

    /// Course outline. Drafts are only visible to their instructor and admins.
    #[instrument(skip(state))]
    pub async fn get_detail(
        state: &AppState,
        id: Uuid,
        viewer: Option<&AuthUser>,
    ) -> Result<CourseDetail, AppError> {
        let course = Self::find_course(state, id).await?;
        let can_manage = viewer.is_some_and(|user| Self::can_manage(&course, user));

        if !course.is_published() && !can_manage {
            return Err(AppError::not_found("Course not found"));
        }

        let is_enrolled = match viewer {
            Some(user) => state
                .repos
                .enrollments
                .find(user.user_id(), course.id)
                .await?
                .is_some(),
            None => false,
        };
        let can_watch = is_enrolled || can_manage;

        let sections = state.repos.sections.list_by_course(course.id).await?;
        let mut lectures = state.repos.lectures.list_by_course(course.id).await?;

        let sections = sections
            .into_iter()
            .map(|section| {
                let (own, rest): (Vec<_>, Vec<_>) = lectures
                    .drain(..)
                    .partition(|lecture| lecture.section_id == section.id);
                lectures = rest;
                SectionWithLectures {
                    id: section.id,
                    title: section.title,
                    position: section.position,
                    lectures: own
                        .into_iter()
                        .map(|lecture| LectureView::from_lecture(lecture, can_watch))
                        .collect(),
                }
            })
            .collect();

        Ok(CourseDetail {
            course,
            is_enrolled,
            sections,
        })
    }

    #[instrument(skip(state))]
    pub async fn create_course(
        state: &AppState,
        instructor_id: Uuid,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        Self::ensure_category(state, dto.category_id).await?;

        let thumbnail_key = dto
            .thumbnail_key
            .as_deref()
            .map(|key| Self::instructor_key(instructor_id, "thumbnailKey", key))
            .transpose()?;

        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            instructor_id,
            category_id: dto.category_id,
            title: dto.title.trim().to_string(),
            description: dto.description.trim().to_string(),
            price: dto.price,
            thumbnail_key,
            level: dto.level,
            status: CourseStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        state.repos.courses.create(&course).await?;

        info!(course_id = %course.id, "Course created");
        Ok(course)
    }

    #[instrument(skip(state))]
    pub async fn update_course(
        state: &AppState,
        auth_user: &AuthUser,
        id: Uuid,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let mut course = Self::owned_course(state, auth_user, id).await?;

        if let Some(category_id) = dto.category_id {
            Self::ensure_category(state, category_id).await?;
            course.category_id = category_id;
        }
        if let Some(title) = dto.title {
            course.title = title.trim().to_string();
        }
        if let Some(description) = dto.description {
            course.description = description.trim().to_string();
        }
        if let Some(price) = dto.price {
            course.price = price;
        }
        if let Some(level) = dto.level {
            course.level = level;
        }
        if let Some(thumbnail_key) = dto.thumbnail_key {
            course.thumbnail_key = Some(Self::instructor_key(
                course.instructor_id,
                "thumbnailKey",
                &thumbnail_key,
            )?);
        }
        course.updated_at = Utc::now();

        state.repos.courses.update(&course).await?;
        Ok(course)
    }

    #[instrument(skip(state))]
    pub async fn delete_course(
        state: &AppState,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<(), AppError> {
        let course = Self::owned_course(state, auth_user, id).await?;

        if state.repos.enrollments.count_for_course(course.id).await? > 0 {
            return Err(AppError::bad_request(
                "Cannot delete a course that has enrolled students",
            ));
        }

        state.repos.courses.delete(course.id).await?;
        info!(course_id = %course.id, "Course deleted");
        Ok(())
    }

    #[instrument(skip(state))]
    pub async fn publish_course(
        state: &AppState,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<Course, AppError> {
        let mut course = Self::owned_course(state, auth_user, id).await?;

        if state.repos.lectures.count_ready(course.id).await? == 0 {
            return Err(AppError::bad_request(
                "A course needs at least one ready lecture before it can be published",
            ));
        }

        if course.status != CourseStatus::Published {
            course.status = CourseStatus::Published;
            course.updated_at = Utc::now();
            state.repos.courses.update(&course).await?;
            info!(course_id = %course.id, "Course published");
        }

        Ok(course)
    }

    // Sections

    async fn section_in_course(
        state: &AppState,
        course_id: Uuid,
        section_id: Uuid,
    ) -> Result<Section, AppError> {
        state
            .repos
            .sections
            .find_by_id(section_id)
            .await?
            .filter(|section| section.course_id == course_id)
            .ok_or_else(|| AppError::not_found("Section not found"))
    }

    #[instrument(skip(state))]
    pub async fn create_section(
        state: &AppState,
        auth_user: &AuthUser,
        course_id: Uuid,
        dto: CreateSectionDto,
    ) -> Result<Section, AppError> {
        let course = Self::owned_course(state, auth_user, course_id).await?;

        let position = match dto.position {
            Some(position) => position,
            None => state.repos.sections.list_by_course(course.id).await?.len() as i32,
        };

        let section = Section {
            id: Uuid::new_v4(),
            course_id: course.id,
            title: dto.title.trim().to_string(),
            position,
            created_at: Utc::now(),
        };
        state.repos.sections.create(&section).await?;
        Ok(section)
    }

    #[instrument(skip(state))]
    pub async fn update_section(
        state: &AppState,
        auth_user: &AuthUser,
        course_id: Uuid,
        section_id: Uuid,
        dto: UpdateSectionDto,
    ) -> Result<Section, AppError> {
        Self::owned_course(state, auth_user, course_id).await?;
        let mut section = Self::section_in_course(state, course_id, section_id).await?;

        if let Some(title) = dto.title {
            section.title = title.trim().to_string();
        }
        if let Some(position) = dto.position {
            section.position = position;
        }

        state.repos.sections.update(&section).await?;
        Ok(section)
    }

    #[instrument(skip(state))]
    pub async fn delete_section(
        state: &AppState,
        auth_user: &AuthUser,
        course_id: Uuid,
        section_id: Uuid,
    ) -> Result<(), AppError> {
        Self::owned_course(state, auth_user, course_id).await?;
        let section = Self::section_in_course(state, course_id, section_id).await?;
        state.repos.sections.delete(section.id).await?;
        Ok(())
    }

    // Lectures

    async fn announce_upload(state: &AppState, user_id: Uuid, lecture: &Lecture) {
        let Some(key) = lecture.video_key.clone() else {
            return;
        };

        let event = LectureEvent::uploaded(LectureEventData {
            user_id,
            course_id: lecture.course_id,
            section_id: lecture.section_id,
            lecture_id: lecture.id,
            key,
            duration_seconds: None,
        });

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode lecture event");
                return;
            }
        };

        if let Err(e) = state.publisher.publish(LECTURE_EVENTS_CHANNEL, payload).await {
            warn!(lecture_id = %lecture.id, error = %e, "Failed to publish lecture event");
        }
    }

    #[instrument(skip(state))]
    pub async fn create_lecture(
        state: &AppState,
        auth_user: &AuthUser,
        course_id: Uuid,
        section_id: Uuid,
        dto: CreateLectureDto,
    ) -> Result<Lecture, AppError> {
        let course = Self::owned_course(state, auth_user, course_id).await?;
        let section = Self::section_in_course(state, course.id, section_id).await?;

        let video_key = dto
            .key
            .as_deref()
            .map(|key| Self::instructor_key(course.instructor_id, "key", key))
            .transpose()?;

        let position = match dto.position {
            Some(position) => position,
            None => state
                .repos
                .lectures
                .list_by_course(course.id)
                .await?
                .iter()
                .filter(|lecture| lecture.section_id == section.id)
                .count() as i32,
        };

        let now = Utc::now();
        let lecture = Lecture {
            id: Uuid::new_v4(),
            course_id: course.id,
            section_id: section.id,
            title: dto.title.trim().to_string(),
            status: if video_key.is_some() {
                LectureStatus::Processing
            } else {
                LectureStatus::Pending
            },
            video_key,
            duration_seconds: dto.duration_seconds,
            is_preview: dto.is_preview,
            position,
            created_at: now,
            updated_at: now,
        };
        state.repos.lectures.create(&lecture).await?;

        Self::announce_upload(state, course.instructor_id, &lecture).await;

        info!(lecture_id = %lecture.id, status = ?lecture.status, "Lecture created");
        Ok(lecture)
    }

    async fn lecture_in_section(
        state: &AppState,
        course_id: Uuid,
        section_id: Uuid,
        lecture_id: Uuid,
    ) -> Result<Lecture, AppError> {
        state
            .repos
            .lectures
            .find_by_id(lecture_id)
            .await?
            .filter(|lecture| lecture.course_id == course_id && lecture.section_id == section_id)
            .ok_or_else(|| AppError::not_found("Lecture not found"))
    }

    #[instrument(skip(state))]
    pub async fn update_lecture(
        state: &AppState,
        auth_user: &AuthUser,
        course_id: Uuid,
        section_id: Uuid,
        lecture_id: Uuid,
        dto: UpdateLectureDto,
    ) -> Result<Lecture, AppError> {
        let course = Self::owned_course(state, auth_user, course_id).await?;
        let mut lecture = Self::lecture_in_section(state, course.id, section_id, lecture_id).await?;

        let mut key_changed = false;
        if let Some(key) = dto.key {
            let key = sanitize_key(&key)?;
            if lecture.video_key.as_deref() != Some(key.as_str()) {
                lecture.video_key = Some(Self::instructor_key(course.instructor_id, "key", &key)?);
                lecture.status = LectureStatus::Processing;
                key_changed = true;
            }
        }
        if let Some(title) = dto.title {
            lecture.title = title.trim().to_string();
        }
        if let Some(is_preview) = dto.is_preview {
            lecture.is_preview = is_preview;
        }
        if let Some(duration_seconds) = dto.duration_seconds {
            lecture.duration_seconds = Some(duration_seconds);
        }
        if let Some(position) = dto.position {
            lecture.position = position;
        }
        lecture.updated_at = Utc::now();

        state.repos.lectures.update(&lecture).await?;

        if key_changed {
            Self::announce_upload(state, course.instructor_id, &lecture).await;
        }

        Ok(lecture)
    }

    #[instrument(skip(state))]
    pub async fn delete_lecture(
        state: &AppState,
        auth_user: &AuthUser,
        course_id: Uuid,
        section_id: Uuid,
        lecture_id: Uuid,
    ) -> Result<(), AppError> {
        Self::owned_course(state, auth_user, course_id).await?;
        let lecture = Self::lecture_in_section(state, course_id, section_id, lecture_id).await?;
        state.repos.lectures.delete(lecture.id).await?;
        Ok(())
    }

    // Enrollment

    /// Moves `price` coins from the student to the instructor and enrolls
    /// the student, as one unit.
    #[instrument(skip(state))]
    pub async fn enroll(
        state: &AppState,
        auth_user: &AuthUser,
        course_id: Uuid,
    ) -> Result<Enrollment, AppError> {
        let course = Self::find_course(state, course_id).await?;
        let user_id = auth_user.user_id();

        if !course.is_published() {
            return Err(AppError::bad_request("Course is not published"));
        }
        if course.instructor_id == user_id {
            return Err(AppError::bad_request("You cannot enroll in your own course"));
        }
        if state
            .repos
            .enrollments
            .find(user_id, course.id)
            .await?
            .is_some()
        {
            return Err(AppError::bad_request(
                "You are already enrolled in this course",
            ));
        }

        let student = state
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if student.coins < course.price {
            return Err(AppError::bad_request("Insufficient coin balance"));
        }

        let movements = if course.price > 0 {
            let reference = course.id.to_string();
            vec![
                Transaction::new(
                    user_id,
                    TransactionType::Debit,
                    PurchaseType::Course,
                    course.price,
                    format!("Enrollment in {}", course.title),
                )
                .with_reference(reference.clone()),
                Transaction::new(
                    course.instructor_id,
                    TransactionType::Credit,
                    PurchaseType::Course,
                    course.price,
                    format!("Sale of {}", course.title),
                )
                .with_reference(reference),
            ]
        } else {
            Vec::new()
        };

        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            user_id,
            course_id: course.id,
            created_at: Utc::now(),
        };
        state
            .repos
            .enrollments
            .enroll(&enrollment, &movements)
            .await
            .map_err(|e| match e {
                RepoError::Conflict(_) => {
                    AppError::bad_request("You are already enrolled in this course")
                }
                other => other.into(),
            })?;

        track_enrollment();
        NotificationService::notify(
            state,
            course.instructor_id,
            NotificationKind::Enrollment,
            "New enrollment",
            format!("{} enrolled in {}", student.name, course.title),
        )
        .await;

        info!(course_id = %course.id, user_id = %user_id, "Enrolled");
        Ok(enrollment)
    }

    #[instrument(skip(state))]
    pub async fn list_enrolled(
        state: &AppState,
        user_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<Paginated<EnrolledCourse>, AppError> {
        let (items, total) = state
            .repos
            .enrollments
            .list_for_user(user_id, &pagination)
            .await?;
        Ok(Paginated::new(items, total, &pagination))
    }
}
