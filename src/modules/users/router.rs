use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    block_user, change_password, get_profile, list_users, update_profile, update_role,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_profile).patch(update_profile))
        .route("/me/password", patch(change_password))
        .route("/{id}/block", patch(block_user))
        .route("/{id}/role", patch(update_role))
}
