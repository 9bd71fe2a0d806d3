use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    get_balance, get_coin_ratio, list_transactions, purchase_coins, update_coin_ratio,
};

pub fn init_payments_router() -> Router<AppState> {
    Router::new()
        .route("/coin-ratio", get(get_coin_ratio).put(update_coin_ratio))
        .route("/coins/purchase", post(purchase_coins))
        .route("/transactions", get(list_transactions))
        .route("/balance", get(get_balance))
}
