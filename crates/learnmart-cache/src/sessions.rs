//! Refresh-token sessions.
//!
//! A refresh token is only honoured while its `jti` is present here, which
//! makes sign-out and password resets effective before the token expires.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{CacheError, RedisCache, keys};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, jti: &str, user_id: Uuid, ttl: Duration) -> Result<(), CacheError>;

    /// Owner of a live session.
    async fn find(&self, jti: &str) -> Result<Option<Uuid>, CacheError>;

    /// Removing an unknown session is not an error.
    async fn revoke(&self, jti: &str) -> Result<(), CacheError>;

    async fn revoke_all(&self, user_id: Uuid) -> Result<(), CacheError>;
}

#[derive(Clone, Debug)]
pub struct RedisSessionStore {
    cache: RedisCache,
}

impl RedisSessionStore {
    pub fn new(cache: RedisCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    #[instrument(skip(self, jti))]
    async fn create(&self, jti: &str, user_id: Uuid, ttl: Duration) -> Result<(), CacheError> {
        let prefix = self.cache.prefix();
        let index = keys::user_sessions(prefix, user_id);
        let mut conn = self.cache.connection();

        let _: () = redis::pipe()
            .atomic()
            .set_ex(keys::session(prefix, jti), user_id.to_string(), ttl.as_secs().max(1))
            .sadd(&index, jti)
            .expire(&index, ttl.as_secs().max(1) as i64)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    #[instrument(skip(self, jti))]
    async fn find(&self, jti: &str) -> Result<Option<Uuid>, CacheError> {
        let mut conn = self.cache.connection();
        let owner: Option<String> = conn.get(keys::session(self.cache.prefix(), jti)).await?;
        Ok(owner.and_then(|id| Uuid::parse_str(&id).ok()))
    }

    #[instrument(skip(self, jti))]
    async fn revoke(&self, jti: &str) -> Result<(), CacheError> {
        let prefix = self.cache.prefix();
        let mut conn = self.cache.connection();
        let key = keys::session(prefix, jti);

        let owner: Option<String> = conn.get(&key).await?;
        conn.del::<_, ()>(&key).await?;
        if let Some(user_id) = owner.and_then(|id| Uuid::parse_str(&id).ok()) {
            conn.srem::<_, _, ()>(keys::user_sessions(prefix, user_id), jti)
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_all(&self, user_id: Uuid) -> Result<(), CacheError> {
        let prefix = self.cache.prefix();
        let index = keys::user_sessions(prefix, user_id);
        let mut conn = self.cache.connection();

        let jtis: Vec<String> = conn.smembers(&index).await?;
        let mut doomed: Vec<String> = jtis.iter().map(|jti| keys::session(prefix, jti)).collect();
        doomed.push(index);
        conn.del::<_, ()>(&doomed).await?;

        debug!(revoked = jtis.len(), "Sessions revoked");
        Ok(())
    }
}
