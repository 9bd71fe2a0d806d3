use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{ApiResponse, AppError, ErrorResponse, MessageData, Paginated};
use learnmart_models::{
    BlockUserDto, ChangePasswordDto, UpdateProfileDto, UpdateRoleDto, UserFilterParams,
    UserResponse,
};

use super::service::UserService;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user's profile", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = UserService::get_profile(&state, auth_user.user_id()).await?;
    Ok(ApiResponse::ok("Profile fetched successfully", user))
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = UserService::update_profile(&state, auth_user.user_id(), dto).await?;
    Ok(ApiResponse::ok("Profile updated successfully", user))
}

#[utoipa::path(
    patch,
    path = "/api/users/me/password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = MessageData),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<ApiResponse<MessageData>, AppError> {
    let data = UserService::change_password(&state, auth_user.user_id(), dto).await?;
    Ok(ApiResponse::ok("Password changed successfully", data))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Paginated users", body = [UserResponse]),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedQuery(filters): ValidatedQuery<UserFilterParams>,
) -> Result<ApiResponse<Paginated<UserResponse>>, AppError> {
    let users = UserService::list_users(&state, filters).await?;
    Ok(ApiResponse::ok("Users fetched successfully", users))
}

/// Block or unblock a user (admin only)
#[utoipa::path(
    patch,
    path = "/api/users/{id}/block",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = BlockUserDto,
    responses(
        (status = 200, description = "Block status updated", body = UserResponse),
        (status = 400, description = "Cannot block yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn block_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<BlockUserDto>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = UserService::set_blocked(&state, admin.user_id(), id, dto).await?;
    Ok(ApiResponse::ok("User updated successfully", user))
}

/// Change a user's role (admin only)
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateRoleDto>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = UserService::update_role(&state, admin.user_id(), id, dto).await?;
    Ok(ApiResponse::ok("User role updated successfully", user))
}
