use tracing::{instrument, warn};
use uuid::Uuid;

use learnmart_core::{AppError, MessageData, Paginated, RepoError};
use learnmart_models::{Notification, NotificationFilterParams, NotificationKind, UnreadCountResponse};

use crate::state::AppState;

pub struct NotificationService;

fn not_found(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound => AppError::not_found("Notification not found"),
        other => other.into(),
    }
}

impl NotificationService {
    /// Records a notification. Failures are logged and swallowed; a missed
    /// notification never fails the operation that triggered it.
    pub async fn notify(
        state: &AppState,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: impl Into<String>,
    ) {
        let notification = Notification::new(user_id, kind, title, message);
        if let Err(e) = state.repos.notifications.create(&notification).await {
            warn!(user_id = %user_id, error = %e, "Failed to record notification");
        }
    }

    #[instrument(skip(state))]
    pub async fn list(
        state: &AppState,
        user_id: Uuid,
        filters: NotificationFilterParams,
    ) -> Result<Paginated<Notification>, AppError> {
        let (items, total) = state.repos.notifications.list(user_id, &filters).await?;
        Ok(Paginated::new(items, total, &filters.pagination))
    }

    #[instrument(skip(state))]
    pub async fn unread_count(
        state: &AppState,
        user_id: Uuid,
    ) -> Result<UnreadCountResponse, AppError> {
        let count = state.repos.notifications.unread_count(user_id).await?;
        Ok(UnreadCountResponse { count })
    }

    #[instrument(skip(state))]
    pub async fn mark_read(
        state: &AppState,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Notification, AppError> {
        state
            .repos
            .notifications
            .mark_read(user_id, id)
            .await
            .map_err(not_found)
    }

    #[instrument(skip(state))]
    pub async fn mark_all_read(state: &AppState, user_id: Uuid) -> Result<MessageData, AppError> {
        let updated = state.repos.notifications.mark_all_read(user_id).await?;
        Ok(MessageData::new(format!(
            "{} notification(s) marked as read",
            updated
        )))
    }

    #[instrument(skip(state))]
    pub async fn delete(state: &AppState, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        state
            .repos
            .notifications
            .delete(user_id, id)
            .await
            .map_err(not_found)
    }
}
