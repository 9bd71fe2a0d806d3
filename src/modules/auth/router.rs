use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    forgot_password, me, refresh_token, resend_otp, reset_password, sign_in, sign_out, sign_up,
    verify_otp,
};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/resend-otp", post(resend_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/sign-in", post(sign_in))
        .route("/refresh-token", post(refresh_token))
        .route("/sign-out", post(sign_out))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/me", get(me))
}
