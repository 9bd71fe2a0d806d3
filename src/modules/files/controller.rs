use axum::extract::State;
use tracing::instrument;

use learnmart_core::{ApiResponse, AppError, ErrorResponse};
use learnmart_models::{DownloadUrlParams, SignedUrlDto, SignedUrlResponse};

use super::service::FileService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[utoipa::path(
    post,
    path = "/api/files/signed-url",
    request_body = SignedUrlDto,
    responses(
        (status = 200, description = "Pre-signed upload URL", body = SignedUrlResponse),
        (status = 400, description = "Invalid key", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Files",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_signed_url(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<SignedUrlDto>,
) -> Result<ApiResponse<SignedUrlResponse>, AppError> {
    let url = FileService::signed_upload_url(&state, &auth_user, dto).await?;
    Ok(ApiResponse::ok("Signed URL generated successfully", url))
}

#[utoipa::path(
    get,
    path = "/api/files/download-url",
    params(DownloadUrlParams),
    responses(
        (status = 200, description = "Pre-signed download URL", body = SignedUrlResponse),
        (status = 400, description = "Invalid key", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "No access to this file", body = ErrorResponse)
    ),
    tag = "Files",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_download_url(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedQuery(params): ValidatedQuery<DownloadUrlParams>,
) -> Result<ApiResponse<SignedUrlResponse>, AppError> {
    let url = FileService::signed_download_url(&state, &auth_user, params).await?;
    Ok(ApiResponse::ok("Signed URL generated successfully", url))
}
