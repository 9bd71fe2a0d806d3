//! # LearnMart Config
//!
//! Configuration types for the LearnMart API.
//!
//! Every struct here is loaded once from environment variables at startup
//! and shared immutably afterwards:
//!
//! - [`jwt`]: The three token secrets and their fixed lifetimes
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`email`]: Email/SMTP configuration
//! - [`storage`]: Object storage endpoint, buckets and URL signing key
//! - [`otp`]: Sign-up OTP lifetime, resend cooldown and attempt limit
//! - [`server`]: Bind address and database/redis URLs
//!
//! # Example
//!
//! ```ignore
//! use learnmart_config::AppConfig;
//!
//! let config = AppConfig::from_env();
//! config.validate()?;
//! ```

pub mod cors;
pub mod email;
pub mod jwt;
pub mod otp;
pub mod server;
pub mod storage;

pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use otp::OtpConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptySecret(&'static str),
    #[error("{0} and {1} must be different")]
    DuplicateSecret(&'static str, &'static str),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Aggregate of every configuration section.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub otp: OtpConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            jwt: JwtConfig::from_env(),
            email: EmailConfig::from_env(),
            cors: CorsConfig::from_env(),
            storage: StorageConfig::from_env(),
            otp: OtpConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.storage.validate()?;
        self.otp.validate()
    }
}
