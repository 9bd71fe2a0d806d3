use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{RepoError, RepoResult};
use learnmart_models::{Notification, NotificationFilterParams};

use crate::error::map_db_error;
use crate::traits::{NotificationRepository, Page};

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, is_read, created_at";

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    user_id: Uuid,
    filters: &NotificationFilterParams,
) {
    builder.push(" WHERE user_id = ").push_bind(user_id);
    if filters.unread_only == Some(true) {
        builder.push(" AND is_read = FALSE");
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    #[instrument(skip(self, notification), fields(notification.user_id = %notification.user_id))]
    async fn create(&self, notification: &Notification) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        user_id: Uuid,
        filters: &NotificationFilterParams,
    ) -> RepoResult<Page<Notification>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM notifications");
        push_filters(&mut count, user_id, filters);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications"
        ));
        push_filters(&mut query, user_id, filters);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let notifications = query
            .build_query_as::<Notification>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok((notifications, total))
    }

    #[instrument(skip(self))]
    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> RepoResult<Notification> {
        sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or(RepoError::NotFound)
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, user_id: Uuid) -> RepoResult<i64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() as i64)
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: Uuid, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
