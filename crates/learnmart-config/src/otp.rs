use std::env;

use crate::ConfigError;

/// Sign-up OTP settings.
///
/// - `OTP_TTL_SECONDS`: how long a pending sign-up lives (default 600)
/// - `OTP_RESEND_COOLDOWN_SECONDS`: minimum gap between sends (default 60)
/// - `OTP_MAX_ATTEMPTS`: wrong guesses before the pending sign-up is dropped (default 5)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpConfig {
    pub ttl_seconds: u64,
    pub resend_cooldown_seconds: u64,
    pub max_attempts: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            resend_cooldown_seconds: 60,
            max_attempts: 5,
        }
    }
}

impl OtpConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_seconds: env::var("OTP_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ttl_seconds),
            resend_cooldown_seconds: env::var("OTP_RESEND_COOLDOWN_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.resend_cooldown_seconds),
            max_attempts: env::var("OTP_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_seconds == 0 {
            return Err(ConfigError::NotPositive("OTP_TTL_SECONDS"));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::NotPositive("OTP_MAX_ATTEMPTS"));
        }
        Ok(())
    }
}
