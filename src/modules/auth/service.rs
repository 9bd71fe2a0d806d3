use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use learnmart_auth::{generate_otp, hash_otp, verify_otp};
use learnmart_core::{AppError, MessageData, hash_password, verify_password};
use learnmart_models::{
    AccessTokenResponse, ForgotPasswordRequest, PendingSignup, RefreshTokenRequest,
    ResendOtpRequest, ResetPasswordRequest, SignInRequest, SignInResponse, SignOutRequest,
    SignUpRequest, User, UserResponse, UserRole, VerifyOtpRequest, normalize_email,
};
use learnmart_observability::{
    track_token_issued, track_user_created, track_user_login_failure, track_user_login_success,
};

use crate::state::AppState;

pub const OTP_SENT_MESSAGE: &str = "OTP send successfully";
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent";

pub struct AuthService;

impl AuthService {
    fn otp_ttl(state: &AppState) -> Duration {
        Duration::from_secs(state.config.otp.ttl_seconds)
    }

    /// Stores a fresh code for the pending sign-up and mails it. The entry
    /// lives for `ttl`.
    async fn dispatch_otp(
        state: &AppState,
        name: &str,
        email: &str,
        password_hash: String,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let otp = generate_otp();
        let pending = PendingSignup {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            otp_hash: hash_otp(email, &otp),
            attempts: 0,
            last_sent_at: Utc::now().timestamp(),
        };

        state
            .otp_store
            .put(&pending, ttl)
            .await
            .map_err(AppError::internal)?;

        state.mailer.send_otp(email, name, &otp).await
    }

    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn sign_up(state: &AppState, dto: SignUpRequest) -> Result<MessageData, AppError> {
        let email = normalize_email(&dto.email);

        if state.repos.users.email_exists(&email).await? {
            return Err(AppError::bad_request("Email already exists"));
        }

        let password_hash = hash_password(&dto.password)?;
        Self::dispatch_otp(
            state,
            dto.name.trim(),
            &email,
            password_hash,
            Self::otp_ttl(state),
        )
        .await?;

        info!(email = %email, "Pending sign-up stored, OTP dispatched");
        Ok(MessageData::new(OTP_SENT_MESSAGE))
    }

    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn resend_otp(
        state: &AppState,
        dto: ResendOtpRequest,
    ) -> Result<MessageData, AppError> {
        let email = normalize_email(&dto.email);

        let pending = state
            .otp_store
            .get(&email)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::not_found("No pending sign-up for this email"))?;

        let cooldown = state.config.otp.resend_cooldown_seconds as i64;
        let elapsed = Utc::now().timestamp() - pending.last_sent_at;
        if elapsed < cooldown {
            return Err(AppError::bad_request(format!(
                "Please wait {} seconds before requesting a new OTP",
                cooldown - elapsed
            )));
        }

        // A resend replaces the code but keeps the original deadline
        let remaining = state
            .otp_store
            .remaining(&email)
            .await
            .map_err(AppError::internal)?
            .filter(|ttl| !ttl.is_zero())
            .ok_or_else(|| AppError::not_found("No pending sign-up for this email"))?;

        Self::dispatch_otp(state, &pending.name, &email, pending.password_hash, remaining).await?;

        Ok(MessageData::new(OTP_SENT_MESSAGE))
    }

    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn verify_otp(
        state: &AppState,
        dto: VerifyOtpRequest,
    ) -> Result<UserResponse, AppError> {
        let email = normalize_email(&dto.email);

        let mut pending = state
            .otp_store
            .get(&email)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::bad_request("OTP has expired, please sign up again"))?;

        if !verify_otp(&email, &dto.otp, &pending.otp_hash) {
            pending.attempts += 1;

            if pending.attempts >= state.config.otp.max_attempts {
                state
                    .otp_store
                    .delete(&email)
                    .await
                    .map_err(AppError::internal)?;
                warn!(email = %email, "Pending sign-up discarded after too many OTP attempts");
                return Err(AppError::bad_request(
                    "Too many invalid attempts, please sign up again",
                ));
            }

            // Keep the original expiry
            let remaining = state
                .otp_store
                .remaining(&email)
                .await
                .map_err(AppError::internal)?
                .unwrap_or_else(|| Self::otp_ttl(state));
            state
                .otp_store
                .put(&pending, remaining)
                .await
                .map_err(AppError::internal)?;

            return Err(AppError::bad_request("Invalid OTP"));
        }

        if state.repos.users.email_exists(&email).await? {
            state
                .otp_store
                .delete(&email)
                .await
                .map_err(AppError::internal)?;
            return Err(AppError::bad_request("Email already exists"));
        }

        let user = User::new(
            pending.name,
            &email,
            pending.password_hash,
            UserRole::Student,
        );
        state.repos.users.create(&user).await?;
        state
            .otp_store
            .delete(&email)
            .await
            .map_err(AppError::internal)?;

        track_user_created(user.role.as_str());
        info!(user_id = %user.id, "Account created");

        Ok(user.into())
    }

    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn sign_in(state: &AppState, dto: SignInRequest) -> Result<SignInResponse, AppError> {
        let email = normalize_email(&dto.email);

        let Some(user) = state.repos.users.find_by_email(&email).await? else {
            track_user_login_failure("unknown_email");
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if !verify_password(&dto.password, &user.password_hash)? {
            track_user_login_failure("wrong_password");
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        if user.is_blocked {
            track_user_login_failure("blocked");
            return Err(AppError::forbidden("Your account has been blocked"));
        }

        let access_token = state
            .tokens
            .issue_access_token(user.id, &user.email, user.role)?;
        let (refresh_token, refresh_claims) = state.tokens.issue_refresh_token(user.id)?;

        let session_ttl = Duration::from_secs(state.config.jwt.refresh_token_expiry.max(0) as u64);
        state
            .sessions
            .create(&refresh_claims.jti, user.id, session_ttl)
            .await
            .map_err(AppError::internal)?;

        track_user_login_success(user.role.as_str());
        track_token_issued("access");
        track_token_issued("refresh");

        Ok(SignInResponse {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    #[instrument(skip(state, dto))]
    pub async fn refresh_token(
        state: &AppState,
        dto: RefreshTokenRequest,
    ) -> Result<AccessTokenResponse, AppError> {
        let claims = state.tokens.verify_refresh_token(&dto.refresh_token)?;

        let owner = state
            .sessions
            .find(&claims.jti)
            .await
            .map_err(AppError::internal)?;
        if owner != Some(claims.id) {
            return Err(AppError::invalid_token());
        }

        let user = state
            .repos
            .users
            .find_by_id(claims.id)
            .await?
            .ok_or_else(AppError::invalid_token)?;

        if user.is_blocked {
            return Err(AppError::forbidden("Your account has been blocked"));
        }

        let access_token = state
            .tokens
            .issue_access_token(user.id, &user.email, user.role)?;
        track_token_issued("access");

        Ok(AccessTokenResponse { access_token })
    }

    #[instrument(skip(state, dto))]
    pub async fn sign_out(state: &AppState, dto: SignOutRequest) -> Result<MessageData, AppError> {
        let claims = state.tokens.verify_refresh_token(&dto.refresh_token)?;

        state
            .sessions
            .revoke(&claims.jti)
            .await
            .map_err(AppError::internal)?;

        Ok(MessageData::new("Signed out successfully"))
    }

    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn forgot_password(
        state: &AppState,
        dto: ForgotPasswordRequest,
    ) -> Result<MessageData, AppError> {
        let email = normalize_email(&dto.email);

        if let Some(user) = state.repos.users.find_by_email(&email).await? {
            let token = state.tokens.issue_reset_token(&user.email)?;
            track_token_issued("reset");

            if let Err(e) = state
                .mailer
                .send_password_reset(&user.email, &user.name, &token)
                .await
            {
                warn!(error = %e, "Failed to send password reset email");
            }
        }

        Ok(MessageData::new(FORGOT_PASSWORD_MESSAGE))
    }

    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn reset_password(
        state: &AppState,
        dto: ResetPasswordRequest,
    ) -> Result<MessageData, AppError> {
        let email = normalize_email(&dto.email);

        state.tokens.verify_reset_token(&dto.token, &email)?;

        let user = state
            .repos
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(AppError::invalid_token)?;

        let password_hash = hash_password(&dto.password)?;
        state
            .repos
            .users
            .update_password(user.id, &password_hash)
            .await?;
        state
            .sessions
            .revoke_all(user.id)
            .await
            .map_err(AppError::internal)?;

        if let Err(e) = state
            .mailer
            .send_password_reset_confirmation(&user.email, &user.name)
            .await
        {
            warn!(error = %e, "Failed to send password reset confirmation");
        }

        info!(user_id = %user.id, "Password reset");
        Ok(MessageData::new("Password reset successfully"))
    }

    #[instrument(skip(state))]
    pub async fn current_user(state: &AppState, user_id: Uuid) -> Result<UserResponse, AppError> {
        state
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
