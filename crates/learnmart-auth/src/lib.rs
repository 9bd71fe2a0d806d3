//! # LearnMart Auth
//!
//! Token lifecycle and one-time codes for the LearnMart API.
//!
//! - [`claims`]: Claim structures for the three token kinds
//! - [`tokens`]: [`TokenManager`], which issues and verifies them
//! - [`otp`]: Six-digit sign-up codes and their hashing
//!
//! # Token Types
//!
//! | Kind | Claims | Lifetime | Secret |
//! |------|--------|----------|--------|
//! | Access | `id`, `email`, `role` | 15 minutes | `JWT_ACCESS_SECRET` |
//! | Refresh | `id`, `jti` | 1 day | `JWT_REFRESH_SECRET` |
//! | Reset | `email`, `purpose` | 5 minutes | `JWT_RESET_SECRET` |
//!
//! A token of one kind never verifies as another kind because every kind
//! has its own secret.
//!
//! # Example
//!
//! ```ignore
//! use learnmart_auth::TokenManager;
//! use learnmart_config::JwtConfig;
//!
//! let tokens = TokenManager::new(&JwtConfig::from_env());
//! let access = tokens.issue_access_token(user.id, &user.email, user.role)?;
//! let claims = tokens.verify_access_token(&access)?;
//! ```

pub mod claims;
pub mod otp;
pub mod tokens;

pub use claims::{AccessClaims, RESET_PURPOSE, RefreshClaims, ResetClaims};
pub use otp::{OTP_LENGTH, generate_otp, hash_otp, verify_otp};
pub use tokens::{TokenManager, constant_time_eq};
