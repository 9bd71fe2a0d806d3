use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::RepoResult;
use learnmart_models::{PurchaseType, Transaction, TransactionFilterParams};

use super::ledger::apply_movements;
use crate::error::map_db_error;
use crate::traits::{Page, TransactionRepository};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, purchase_type, coins, amount, reference_id, description, created_at";

#[derive(Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `all` filters add no condition.
fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    user_id: Uuid,
    filters: &TransactionFilterParams,
) {
    builder.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(transaction_type) = filters.transaction_type.as_type() {
        builder.push(" AND type = ").push_bind(transaction_type);
    }
    if let Some(purchase_type) = filters.purchase_type.as_type() {
        builder.push(" AND purchase_type = ").push_bind(purchase_type);
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    #[instrument(skip(self, movements), fields(count = movements.len()))]
    async fn apply(&self, movements: &[Transaction]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        apply_movements(&mut *tx, movements).await?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_reference(
        &self,
        purchase_type: PurchaseType,
        reference_id: &str,
    ) -> RepoResult<Option<Transaction>> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE purchase_type = $1 AND reference_id = $2"
        ))
        .bind(purchase_type)
        .bind(reference_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        user_id: Uuid,
        filters: &TransactionFilterParams,
    ) -> RepoResult<Page<Transaction>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM transactions");
        push_filters(&mut count, user_id, filters);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions"
        ));
        push_filters(&mut query, user_id, filters);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let transactions = query
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok((transactions, total))
    }
}
