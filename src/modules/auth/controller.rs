use axum::extract::State;
use tracing::instrument;

use learnmart_core::{ApiResponse, AppError, ErrorResponse, MessageData};
use learnmart_models::{
    AccessTokenResponse, ForgotPasswordRequest, RefreshTokenRequest, ResendOtpRequest,
    ResetPasswordRequest, SignInRequest, SignInResponse, SignOutRequest, SignUpRequest,
    UserResponse, VerifyOtpRequest,
};

use super::service::{AuthService, OTP_SENT_MESSAGE};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Start a sign-up and email a one-time code
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageData),
        (status = 400, description = "Email already exists or malformed body", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SignUpRequest>,
) -> Result<ApiResponse<MessageData>, AppError> {
    let data = AuthService::sign_up(&state, dto).await?;
    Ok(ApiResponse::ok(OTP_SENT_MESSAGE, data))
}

/// Send a fresh code for a pending sign-up
#[utoipa::path(
    post,
    path = "/api/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageData),
        (status = 400, description = "Cooldown still running", body = ErrorResponse),
        (status = 404, description = "No pending sign-up", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn resend_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResendOtpRequest>,
) -> Result<ApiResponse<MessageData>, AppError> {
    let data = AuthService::resend_otp(&state, dto).await?;
    Ok(ApiResponse::ok(OTP_SENT_MESSAGE, data))
}

/// Confirm the code and create the account
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid or expired OTP", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyOtpRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = AuthService::verify_otp(&state, dto).await?;
    Ok(ApiResponse::created("Account created successfully", user))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account blocked", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SignInRequest>,
) -> Result<ApiResponse<SignInResponse>, AppError> {
    let response = AuthService::sign_in(&state, dto).await?;
    Ok(ApiResponse::ok("Signed in successfully", response))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid or revoked refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<ApiResponse<AccessTokenResponse>, AppError> {
    let response = AuthService::refresh_token(&state, dto).await?;
    Ok(ApiResponse::ok("Token refreshed successfully", response))
}

/// End the session behind a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    request_body = SignOutRequest,
    responses(
        (status = 200, description = "Signed out", body = MessageData),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn sign_out(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SignOutRequest>,
) -> Result<ApiResponse<MessageData>, AppError> {
    let data = AuthService::sign_out(&state, dto).await?;
    Ok(ApiResponse::ok("Signed out successfully", data))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageData)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<ApiResponse<MessageData>, AppError> {
    let data = AuthService::forgot_password(&state, dto).await?;
    Ok(ApiResponse::ok("Password reset requested", data))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageData),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<ApiResponse<MessageData>, AppError> {
    let data = AuthService::reset_password(&state, dto).await?;
    Ok(ApiResponse::ok("Password reset successfully", data))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = AuthService::current_user(&state, auth_user.user_id()).await?;
    Ok(ApiResponse::ok("User fetched successfully", user))
}
