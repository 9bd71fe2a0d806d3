//! Token secrets.
//!
//! Lifetimes are fixed constants, only the secrets come from the
//! environment. The three secrets must be non-empty and pairwise distinct.

use std::env;

use crate::ConfigError;

/// Access tokens live 15 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;
/// Refresh tokens live 1 day.
pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = 24 * 60 * 60;
/// Password-reset tokens live 5 minutes.
pub const RESET_TOKEN_EXPIRY_SECS: i64 = 5 * 60;

#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub reset_secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub reset_token_expiry: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("reset_token_expiry", &self.reset_token_expiry)
            .finish_non_exhaustive()
    }
}

impl JwtConfig {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        reset_secret: impl Into<String>,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            reset_secret: reset_secret.into(),
            access_token_expiry: ACCESS_TOKEN_EXPIRY_SECS,
            refresh_token_expiry: REFRESH_TOKEN_EXPIRY_SECS,
            reset_token_expiry: RESET_TOKEN_EXPIRY_SECS,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env::var("JWT_ACCESS_SECRET").unwrap_or_default(),
            env::var("JWT_REFRESH_SECRET").unwrap_or_default(),
            env::var("JWT_RESET_SECRET").unwrap_or_default(),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secrets = [
            ("JWT_ACCESS_SECRET", &self.access_secret),
            ("JWT_REFRESH_SECRET", &self.refresh_secret),
            ("JWT_RESET_SECRET", &self.reset_secret),
        ];

        for (name, secret) in &secrets {
            if secret.trim().is_empty() {
                return Err(ConfigError::EmptySecret(name));
            }
        }

        for (i, (a_name, a)) in secrets.iter().enumerate() {
            for (b_name, b) in &secrets[i + 1..] {
                if a == b {
                    return Err(ConfigError::DuplicateSecret(a_name, b_name));
                }
            }
        }

        Ok(())
    }
}
