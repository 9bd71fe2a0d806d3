//! Pending sign-ups keyed by normalized email.

use std::time::Duration;

use async_trait::async_trait;
use learnmart_models::PendingSignup;
use tracing::instrument;

use crate::{CacheError, RedisCache, keys};

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores (or replaces) the entry; it expires after `ttl`.
    async fn put(&self, pending: &PendingSignup, ttl: Duration) -> Result<(), CacheError>;

    async fn get(&self, email: &str) -> Result<Option<PendingSignup>, CacheError>;

    /// Remaining lifetime of the entry, if any.
    async fn remaining(&self, email: &str) -> Result<Option<Duration>, CacheError>;

    async fn delete(&self, email: &str) -> Result<(), CacheError>;
}

#[derive(Clone, Debug)]
pub struct RedisOtpStore {
    cache: RedisCache,
}

impl RedisOtpStore {
    pub fn new(cache: RedisCache) -> Self {
        Self { cache }
    }

    fn key(&self, email: &str) -> String {
        keys::pending_signup(self.cache.prefix(), email)
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    #[instrument(skip(self, pending), fields(email = %pending.email))]
    async fn put(&self, pending: &PendingSignup, ttl: Duration) -> Result<(), CacheError> {
        self.cache.set_with_ttl(&self.key(&pending.email), pending, ttl).await
    }

    #[instrument(skip(self))]
    async fn get(&self, email: &str) -> Result<Option<PendingSignup>, CacheError> {
        self.cache.get(&self.key(email)).await
    }

    #[instrument(skip(self))]
    async fn remaining(&self, email: &str) -> Result<Option<Duration>, CacheError> {
        let ttl = self.cache.ttl(&self.key(email)).await?;
        Ok(ttl.map(|secs| Duration::from_secs(secs as u64)))
    }

    #[instrument(skip(self))]
    async fn delete(&self, email: &str) -> Result<(), CacheError> {
        self.cache.invalidate(&self.key(email)).await
    }
}
