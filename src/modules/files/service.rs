use tracing::{debug, instrument};

use learnmart_core::AppError;
use learnmart_core::storage::{
    SignedUrlRequest, TEMP_PREFIX, is_owned_key, sanitize_key, scope_key,
};
use learnmart_models::{CourseStatus, DownloadUrlParams, SignedUrlDto, SignedUrlResponse};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub struct FileService;

impl FileService {
    /// Signs an upload into the caller's own namespace (`users/{id}/...`),
    /// so one account can never overwrite another's objects.
    #[instrument(skip(state, auth_user, dto), fields(key = %dto.key))]
    pub async fn signed_upload_url(
        state: &AppState,
        auth_user: &AuthUser,
        dto: SignedUrlDto,
    ) -> Result<SignedUrlResponse, AppError> {
        let is_temp = dto.is_temp.unwrap_or(false);
        let mut key = scope_key(auth_user.user_id(), &dto.key)?;
        if is_temp && !key.starts_with(TEMP_PREFIX) {
            key = format!("{TEMP_PREFIX}{key}");
        }

        let request = SignedUrlRequest {
            key,
            content_type: dto.content_type.map(|c| c.trim().to_string()),
            is_public: dto.is_public.unwrap_or(false),
            is_temp,
        };

        let url = state.signer.sign_upload(&request)?;
        debug!(user_id = %auth_user.user_id(), is_public = request.is_public, "Upload URL signed");

        Ok(SignedUrlResponse {
            url,
            key: request.key,
        })
    }

    /// Private objects are readable by their uploader, admins, and anyone who
    /// may watch the lecture that points at them.
    #[instrument(skip(state, auth_user, params), fields(key = %params.key))]
    pub async fn signed_download_url(
        state: &AppState,
        auth_user: &AuthUser,
        params: DownloadUrlParams,
    ) -> Result<SignedUrlResponse, AppError> {
        let key = sanitize_key(&params.key)?;
        let is_public = params.is_public.unwrap_or(false);

        if !is_public && !Self::can_read(state, auth_user, &key).await? {
            return Err(AppError::forbidden("You do not have access to this file"));
        }

        let url = state.signer.sign_download(&key, is_public)?;
        Ok(SignedUrlResponse { url, key })
    }

    async fn can_read(state: &AppState, auth_user: &AuthUser, key: &str) -> Result<bool, AppError> {
        let user_id = auth_user.user_id();
        if auth_user.is_admin() || is_owned_key(user_id, key) {
            return Ok(true);
        }

        let Some(lecture) = state.repos.lectures.find_by_video_key(key).await? else {
            return Ok(false);
        };
        let Some(course) = state.repos.courses.find_by_id(lecture.course_id).await? else {
            return Ok(false);
        };
        if course.instructor_id == user_id {
            return Ok(true);
        }
        if lecture.is_preview && course.status == CourseStatus::Published {
            return Ok(true);
        }

        Ok(state
            .repos
            .enrollments
            .find(user_id, course.id)
            .await?
            .is_some())
    }
}
