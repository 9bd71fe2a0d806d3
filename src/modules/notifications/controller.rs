use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{ApiResponse, AppError, ErrorResponse, MessageData, Paginated};
use learnmart_models::{Notification, NotificationFilterParams, UnreadCountResponse};

use super::service::NotificationService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedQuery;

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationFilterParams),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = [Notification]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<NotificationFilterParams>,
) -> Result<ApiResponse<Paginated<Notification>>, AppError> {
    let notifications = NotificationService::list(&state, auth_user.user_id(), filters).await?;
    Ok(ApiResponse::ok("Notifications fetched successfully", notifications))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notifications", body = UnreadCountResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<UnreadCountResponse>, AppError> {
    let count = NotificationService::unread_count(&state, auth_user.user_id()).await?;
    Ok(ApiResponse::ok("Unread count fetched successfully", count))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Notification>, AppError> {
    let notification = NotificationService::mark_read(&state, auth_user.user_id(), id).await?;
    Ok(ApiResponse::ok("Notification marked as read", notification))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked as read", body = MessageData)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<MessageData>, AppError> {
    let data = NotificationService::mark_all_read(&state, auth_user.user_id()).await?;
    Ok(ApiResponse::ok("Notifications marked as read", data))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageData),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<MessageData>, AppError> {
    NotificationService::delete(&state, auth_user.user_id(), id).await?;
    Ok(ApiResponse::ok(
        "Notification deleted successfully",
        MessageData::new("Notification deleted successfully"),
    ))
}
