use axum::extract::State;
use tracing::instrument;

use learnmart_core::{ApiResponse, AppError, ErrorResponse, Paginated};
use learnmart_models::{
    BalanceResponse, CoinRatio, PurchaseCoinsDto, PurchaseCoinsResponse, Transaction,
    TransactionFilterParams, UpdateCoinRatioDto,
};

use super::service::PaymentService;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/payments/coin-ratio",
    responses(
        (status = 200, description = "Current coin ratio", body = CoinRatio)
    ),
    tag = "Payments"
)]
#[instrument(skip(state))]
pub async fn get_coin_ratio(
    State(state): State<AppState>,
) -> Result<ApiResponse<CoinRatio>, AppError> {
    let ratio = PaymentService::get_coin_ratio(&state).await?;
    Ok(ApiResponse::ok("Coin ratio fetched successfully", ratio))
}

#[utoipa::path(
    put,
    path = "/api/payments/coin-ratio",
    request_body = UpdateCoinRatioDto,
    responses(
        (status = 200, description = "Coin ratio updated", body = CoinRatio),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_coin_ratio(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<UpdateCoinRatioDto>,
) -> Result<ApiResponse<CoinRatio>, AppError> {
    let ratio = PaymentService::update_coin_ratio(&state, admin.user_id(), dto).await?;
    Ok(ApiResponse::ok("Coin ratio updated successfully", ratio))
}

#[utoipa::path(
    post,
    path = "/api/payments/coins/purchase",
    request_body = PurchaseCoinsDto,
    responses(
        (status = 201, description = "Coins credited", body = PurchaseCoinsResponse),
        (status = 400, description = "Payment reference already used", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn purchase_coins(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<PurchaseCoinsDto>,
) -> Result<ApiResponse<PurchaseCoinsResponse>, AppError> {
    let result = PaymentService::purchase_coins(&state, auth_user.user_id(), dto).await?;
    Ok(ApiResponse::created("Coins purchased successfully", result))
}

#[utoipa::path(
    get,
    path = "/api/payments/transactions",
    params(TransactionFilterParams),
    responses(
        (status = 200, description = "Transaction history", body = [Transaction]),
        (status = 400, description = "Unknown filter value", body = ErrorResponse)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<TransactionFilterParams>,
) -> Result<ApiResponse<Paginated<Transaction>>, AppError> {
    let transactions =
        PaymentService::list_transactions(&state, auth_user.user_id(), filters).await?;
    Ok(ApiResponse::ok(
        "Transactions fetched successfully",
        transactions,
    ))
}

#[utoipa::path(
    get,
    path = "/api/payments/balance",
    responses(
        (status = 200, description = "Coin balance", body = BalanceResponse)
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_balance(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<BalanceResponse>, AppError> {
    let balance = PaymentService::balance(&state, auth_user.user_id()).await?;
    Ok(ApiResponse::ok("Balance fetched successfully", balance))
}
