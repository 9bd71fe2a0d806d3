use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{PaginationParams, RepoError, RepoResult};
use learnmart_models::{Bid, Gig, GigFilterParams, GigStatus, Transaction};

use super::ledger::apply_movements;
use crate::error::map_db_error;
use crate::traits::{GigRepository, Page};

const GIG_COLUMNS: &str = "id, created_by, title, description, min_bid, starts_at, ends_at, status, winning_bid_id, created_at";
const BID_COLUMNS: &str = "id, gig_id, instructor_id, amount, message, created_at";

#[derive(Clone)]
pub struct PgGigRepository {
    pool: PgPool,
}

impl PgGigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &GigFilterParams) {
    if let Some(status) = filters.status {
        builder.push(" WHERE status = ").push_bind(status);
    }
}

#[async_trait]
impl GigRepository for PgGigRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Gig>> {
        sqlx::query_as::<_, Gig>(&format!("SELECT {GIG_COLUMNS} FROM gigs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self, gig), fields(gig.id = %gig.id))]
    async fn create(&self, gig: &Gig) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO gigs ({GIG_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(gig.id)
        .bind(gig.created_by)
        .bind(&gig.title)
        .bind(&gig.description)
        .bind(gig.min_bid)
        .bind(gig.starts_at)
        .bind(gig.ends_at)
        .bind(gig.status)
        .bind(gig.winning_bid_id)
        .bind(gig.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, filters: &GigFilterParams) -> RepoResult<Page<Gig>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM gigs");
        push_filters(&mut count, filters);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {GIG_COLUMNS} FROM gigs"));
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY ends_at ASC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let gigs = query
            .build_query_as::<Gig>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok((gigs, total))
    }

    #[instrument(skip(self))]
    async fn highest_bid(&self, gig_id: Uuid) -> RepoResult<Option<Bid>> {
        sqlx::query_as::<_, Bid>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE gig_id = $1 ORDER BY amount DESC, created_at ASC LIMIT 1"
        ))
        .bind(gig_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn count_bids(&self, gig_id: Uuid) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bids WHERE gig_id = $1")
            .bind(gig_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    /// Locks the gig row so concurrent bids are compared one at a time.
    #[instrument(skip(self, bid), fields(bid.gig_id = %bid.gig_id, bid.amount = bid.amount))]
    async fn place_bid(&self, bid: &Bid) -> RepoResult<Option<Bid>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM gigs WHERE id = $1 FOR UPDATE")
            .bind(bid.gig_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if locked.is_none() {
            return Err(RepoError::NotFound);
        }

        let previous = sqlx::query_as::<_, Bid>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE gig_id = $1 ORDER BY amount DESC, created_at ASC LIMIT 1"
        ))
        .bind(bid.gig_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if let Some(previous) = &previous
            && bid.amount <= previous.amount
        {
            return Err(RepoError::Conflict(format!(
                "Bid must be higher than the current highest bid of {}",
                previous.amount
            )));
        }

        sqlx::query(&format!(
            "INSERT INTO bids ({BID_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(bid.id)
        .bind(bid.gig_id)
        .bind(bid.instructor_id)
        .bind(bid.amount)
        .bind(&bid.message)
        .bind(bid.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(previous)
    }

    #[instrument(skip(self))]
    async fn list_bids(
        &self,
        gig_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Bid>> {
        let total = self.count_bids(gig_id).await?;
        let bids = sqlx::query_as::<_, Bid>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE gig_id = $1 ORDER BY amount DESC, created_at ASC LIMIT $2 OFFSET $3"
        ))
        .bind(gig_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok((bids, total))
    }

    #[instrument(skip(self))]
    async fn list_bids_by_instructor(
        &self,
        instructor_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Bid>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bids WHERE instructor_id = $1")
            .bind(instructor_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        let bids = sqlx::query_as::<_, Bid>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE instructor_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(instructor_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok((bids, total))
    }

    #[instrument(skip(self))]
    async fn bids_by_amount(&self, gig_id: Uuid) -> RepoResult<Vec<Bid>> {
        sqlx::query_as::<_, Bid>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE gig_id = $1 ORDER BY amount DESC, created_at ASC"
        ))
        .bind(gig_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    /// Only an open gig can be settled; a second settlement sees `Conflict`.
    #[instrument(skip(self, movements))]
    async fn settle(
        &self,
        gig_id: Uuid,
        winning_bid_id: Option<Uuid>,
        movements: &[Transaction],
    ) -> RepoResult<Gig> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let gig = sqlx::query_as::<_, Gig>(&format!(
            r"
            UPDATE gigs SET status = $2, winning_bid_id = $3
            WHERE id = $1 AND status = $4
            RETURNING {GIG_COLUMNS}
            "
        ))
        .bind(gig_id)
        .bind(GigStatus::Closed)
        .bind(winning_bid_id)
        .bind(GigStatus::Open)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| RepoError::Conflict("Gig is already closed".to_string()))?;

        apply_movements(&mut *tx, movements).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(gig)
    }
}
