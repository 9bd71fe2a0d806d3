use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use learnmart_core::RepoResult;
use learnmart_models::CoinRatio;

use crate::error::map_db_error;
use crate::traits::CoinRatioRepository;

/// The ratio lives in a single-row table seeded by the initial migration.
#[derive(Clone)]
pub struct PgCoinRatioRepository {
    pool: PgPool,
}

impl PgCoinRatioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoinRatioRepository for PgCoinRatioRepository {
    #[instrument(skip(self))]
    async fn get(&self) -> RepoResult<CoinRatio> {
        let ratio = sqlx::query_as::<_, CoinRatio>(
            "SELECT coins_per_unit, updated_by, updated_at FROM coin_ratio LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ratio.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn set(&self, ratio: &CoinRatio) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO coin_ratio (id, coins_per_unit, updated_by, updated_at)
            VALUES (TRUE, $1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET coins_per_unit = EXCLUDED.coins_per_unit,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(ratio.coins_per_unit)
        .bind(ratio.updated_by)
        .bind(ratio.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }
}
