//! Balance movements shared by every operation that moves coins.

use learnmart_core::{RepoError, RepoResult};
use learnmart_models::Transaction;
use sqlx::PgConnection;

use crate::error::{map_db_error, map_unique_violation};

/// Applies each movement inside the caller's transaction. The guarded
/// `UPDATE` refuses to take a balance below zero.
pub(crate) async fn apply_movements(
    conn: &mut PgConnection,
    movements: &[Transaction],
) -> RepoResult<()> {
    for movement in movements {
        let updated = sqlx::query_scalar::<_, i64>(
            r"
            UPDATE users
            SET coins = coins + $1, updated_at = NOW()
            WHERE id = $2 AND coins + $1 >= 0
            RETURNING coins
            ",
        )
        .bind(movement.signed_coins())
        .bind(movement.user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?;

        if updated.is_none() {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)",
            )
            .bind(movement.user_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_db_error)?;

            return Err(if exists {
                RepoError::InsufficientCoins
            } else {
                RepoError::NotFound
            });
        }

        sqlx::query(
            r"
            INSERT INTO transactions
                (id, user_id, type, purchase_type, coins, amount, reference_id, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(movement.id)
        .bind(movement.user_id)
        .bind(movement.transaction_type)
        .bind(movement.purchase_type)
        .bind(movement.coins)
        .bind(movement.amount)
        .bind(&movement.reference_id)
        .bind(&movement.description)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_unique_violation(e, "Payment reference already used"))?;
    }

    Ok(())
}
