//! Issuing and verifying the three token kinds.
//!
//! Each kind is signed with HS256 under its own secret and carries a fixed
//! lifetime from [`JwtConfig`]. Verification uses zero leeway, so a token is
//! rejected the second its `exp` passes. Every verification failure maps to
//! [`AppError::InvalidToken`], which never says which check failed.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use learnmart_config::JwtConfig;
use learnmart_core::AppError;
use learnmart_models::{UserRole, normalize_email};

use crate::claims::{AccessClaims, RESET_PURPOSE, RefreshClaims, ResetClaims};

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl SigningKeys {
    fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                AppError::invalid_token()
            })
    }
}

/// Issues and verifies access, refresh and password-reset tokens.
#[derive(Clone)]
pub struct TokenManager {
    access: SigningKeys,
    refresh: SigningKeys,
    reset: SigningKeys,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access: SigningKeys::new(&config.access_secret, config.access_token_expiry),
            refresh: SigningKeys::new(&config.refresh_secret, config.refresh_token_expiry),
            reset: SigningKeys::new(&config.reset_secret, config.reset_token_expiry),
        }
    }

    pub fn issue_access_token(
        &self,
        id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.issue_access_token_at(id, email, role, Utc::now().timestamp())
    }

    /// Same as [`Self::issue_access_token`] with an explicit issue time.
    pub fn issue_access_token_at(
        &self,
        id: Uuid,
        email: &str,
        role: UserRole,
        issued_at: i64,
    ) -> Result<String, AppError> {
        self.access.sign(&AccessClaims {
            id,
            email: email.to_string(),
            role,
            iat: issued_at,
            exp: issued_at + self.access.lifetime_secs,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.access.verify(token)
    }

    /// Returns the token together with its claims so the caller can record the `jti`.
    pub fn issue_refresh_token(&self, id: Uuid) -> Result<(String, RefreshClaims), AppError> {
        self.issue_refresh_token_at(id, Utc::now().timestamp())
    }

    pub fn issue_refresh_token_at(
        &self,
        id: Uuid,
        issued_at: i64,
    ) -> Result<(String, RefreshClaims), AppError> {
        let claims = RefreshClaims {
            id,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at,
            exp: issued_at + self.refresh.lifetime_secs,
        };
        let token = self.refresh.sign(&claims)?;
        Ok((token, claims))
    }

    /// Fails when the signature or expiry is bad, or the payload has no `id`.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AppError> {
        self.refresh.verify(token)
    }

    pub fn issue_reset_token(&self, email: &str) -> Result<String, AppError> {
        self.issue_reset_token_at(email, Utc::now().timestamp())
    }

    pub fn issue_reset_token_at(&self, email: &str, issued_at: i64) -> Result<String, AppError> {
        self.reset.sign(&ResetClaims {
            email: normalize_email(email),
            purpose: RESET_PURPOSE.to_string(),
            iat: issued_at,
            exp: issued_at + self.reset.lifetime_secs,
        })
    }

    /// Accepts the token only for the email it was issued to.
    ///
    /// Both emails are normalized before a constant-time comparison.
    pub fn verify_reset_token(&self, token: &str, email: &str) -> Result<(), AppError> {
        let claims: ResetClaims = self.reset.verify(token)?;

        if claims.purpose != RESET_PURPOSE {
            return Err(AppError::invalid_token());
        }

        let expected = normalize_email(email);
        let actual = normalize_email(&claims.email);
        if !constant_time_eq(expected.as_bytes(), actual.as_bytes()) {
            return Err(AppError::invalid_token());
        }

        Ok(())
    }
}

/// Compares two byte strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TokenManager {
        TokenManager::new(&JwtConfig::new(
            "access-secret-for-tests",
            "refresh-secret-for-tests",
            "reset-secret-for-tests",
        ))
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = manager();
        let id = Uuid::new_v4();

        let token = tokens
            .issue_access_token(id, "ada@example.com", UserRole::Instructor)
            .unwrap();
        let claims = tokens.verify_access_token(&token).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, UserRole::Instructor);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let tokens = manager();
        let id = Uuid::new_v4();

        let (token, issued) = tokens.issue_refresh_token(id).unwrap();
        let claims = tokens.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_refresh_tokens_have_unique_jti() {
        let tokens = manager();
        let id = Uuid::new_v4();
        let (_, a) = tokens.issue_refresh_token(id).unwrap();
        let (_, b) = tokens.issue_refresh_token(id).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_kinds_do_not_cross_verify() {
        let tokens = manager();
        let id = Uuid::new_v4();

        let access = tokens
            .issue_access_token(id, "ada@example.com", UserRole::Student)
            .unwrap();
        let (refresh, _) = tokens.issue_refresh_token(id).unwrap();

        assert!(matches!(
            tokens.verify_refresh_token(&access),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            tokens.verify_access_token(&refresh),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_access_token_is_rejected() {
        let tokens = manager();
        let issued_at = Utc::now().timestamp() - 16 * 60;
        let token = tokens
            .issue_access_token_at(Uuid::new_v4(), "ada@example.com", UserRole::Student, issued_at)
            .unwrap();

        assert!(matches!(
            tokens.verify_access_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_refresh_token_is_rejected() {
        let tokens = manager();
        let issued_at = Utc::now().timestamp() - 24 * 60 * 60 - 5;
        let (token, _) = tokens.issue_refresh_token_at(Uuid::new_v4(), issued_at).unwrap();

        assert!(tokens.verify_refresh_token(&token).is_err());
    }

    #[test]
    fn test_reset_token_matches_email() {
        let tokens = manager();
        let token = tokens.issue_reset_token("ada@example.com").unwrap();

        assert!(tokens.verify_reset_token(&token, "ada@example.com").is_ok());
        assert!(tokens.verify_reset_token(&token, "  ADA@Example.com ").is_ok());
        assert!(matches!(
            tokens.verify_reset_token(&token, "eve@example.com"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_reset_token_expires_after_five_minutes() {
        let tokens = manager();
        let issued_at = Utc::now().timestamp() - 5 * 60 - 5;
        let token = tokens.issue_reset_token_at("ada@example.com", issued_at).unwrap();

        assert!(tokens.verify_reset_token(&token, "ada@example.com").is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            manager().verify_access_token("not.a.token"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
