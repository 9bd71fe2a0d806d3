//! # LearnMart Cache
//!
//! Redis-backed short-lived state for the LearnMart API.
//!
//! This crate provides:
//! - [`RedisCache`]: JSON get/set with TTL over a shared connection manager
//! - [`OtpStore`]: pending sign-ups waiting for OTP confirmation
//! - [`SessionStore`]: refresh-token sessions, revocable one by one or per user
//! - [`EventPublisher`] and [`run_subscriber`]: lecture-event pub/sub
//! - [`memory`]: in-process stand-ins for tests (feature `test-utils`)
//!
//! # Example
//!
//! ```ignore
//! use learnmart_cache::{CacheConfig, RedisCache, RedisOtpStore};
//!
//! let config = CacheConfig::from_env();
//! let cache = RedisCache::new(&config).await?;
//! let otp_store = RedisOtpStore::new(cache.clone());
//! ```

pub mod config;
pub mod events;
pub mod keys;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod otp;
pub mod redis;
pub mod sessions;

pub use config::CacheConfig;
pub use events::{EventPublisher, RedisPublisher, run_subscriber};
pub use otp::{OtpStore, RedisOtpStore};
pub use redis::{CacheError, RedisCache};
pub use sessions::{RedisSessionStore, SessionStore};
