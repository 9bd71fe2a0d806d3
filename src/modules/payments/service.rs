use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use learnmart_core::{AppError, Paginated, RepoError};
use learnmart_models::{
    BalanceResponse, CoinRatio, NotificationKind, PurchaseCoinsDto, PurchaseCoinsResponse,
    PurchaseType, Transaction, TransactionFilterParams, TransactionType, UpdateCoinRatioDto,
};
use learnmart_observability::track_coins_purchased;

use crate::modules::notifications::NotificationService;
use crate::state::AppState;

const DUPLICATE_REFERENCE: &str = "This payment reference has already been used";

pub struct PaymentService;

impl PaymentService {
    #[instrument(skip(state))]
    pub async fn get_coin_ratio(state: &AppState) -> Result<CoinRatio, AppError> {
        Ok(state.repos.coin_ratio.get().await?)
    }

    #[instrument(skip(state))]
    pub async fn update_coin_ratio(
        state: &AppState,
        admin_id: Uuid,
        dto: UpdateCoinRatioDto,
    ) -> Result<CoinRatio, AppError> {
        let ratio = CoinRatio {
            coins_per_unit: dto.coins_per_unit,
            updated_by: Some(admin_id),
            updated_at: Utc::now(),
        };
        state.repos.coin_ratio.set(&ratio).await?;

        info!(coins_per_unit = ratio.coins_per_unit, "Coin ratio updated");
        Ok(ratio)
    }

    /// Credits `amount × coins_per_unit` coins. A payment reference can only
    /// be redeemed once.
    #[instrument(skip(state, dto), fields(amount = dto.amount))]
    pub async fn purchase_coins(
        state: &AppState,
        user_id: Uuid,
        dto: PurchaseCoinsDto,
    ) -> Result<PurchaseCoinsResponse, AppError> {
        let reference = dto.payment_reference.trim().to_string();
        if reference.is_empty() {
            return Err(AppError::bad_request("paymentReference is required"));
        }

        if state
            .repos
            .transactions
            .find_by_reference(PurchaseType::Coins, &reference)
            .await?
            .is_some()
        {
            return Err(AppError::bad_request(DUPLICATE_REFERENCE));
        }

        let ratio = state.repos.coin_ratio.get().await?;
        let coins = dto
            .amount
            .checked_mul(ratio.coins_per_unit)
            .ok_or_else(|| AppError::bad_request("Purchase amount is too large"))?;

        let transaction = Transaction::new(
            user_id,
            TransactionType::Credit,
            PurchaseType::Coins,
            coins,
            format!("Purchased {} coins", coins),
        )
        .with_amount(dto.amount)
        .with_reference(reference);

        state
            .repos
            .transactions
            .apply(std::slice::from_ref(&transaction))
            .await
            .map_err(|e| match e {
                RepoError::Conflict(_) => AppError::bad_request(DUPLICATE_REFERENCE),
                other => other.into(),
            })?;

        let balance = Self::balance(state, user_id).await?.coins;

        track_coins_purchased(coins);
        NotificationService::notify(
            state,
            user_id,
            NotificationKind::Payment,
            "Coins purchased",
            format!("{} coins were added to your balance", coins),
        )
        .await;

        info!(user_id = %user_id, coins, "Coins purchased");
        Ok(PurchaseCoinsResponse {
            transaction,
            balance,
        })
    }

    #[instrument(skip(state))]
    pub async fn list_transactions(
        state: &AppState,
        user_id: Uuid,
        filters: TransactionFilterParams,
    ) -> Result<Paginated<Transaction>, AppError> {
        let (items, total) = state.repos.transactions.list(user_id, &filters).await?;
        Ok(Paginated::new(items, total, &filters.pagination))
    }

    #[instrument(skip(state))]
    pub async fn balance(state: &AppState, user_id: Uuid) -> Result<BalanceResponse, AppError> {
        let user = state
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(BalanceResponse { coins: user.coins })
    }
}
