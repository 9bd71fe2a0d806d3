//! Redis client with JSON serialization for stored values.

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::CacheConfig;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Shares one multiplexed connection; clones are cheap.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    conn: ConnectionManager,
    prefix: String,
    reconnect_delay: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL is invalid or Redis is unreachable.
    pub async fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client.clone()).await?;

        Ok(Self {
            client,
            conn,
            prefix: config.key_prefix.clone(),
            reconnect_delay: config.reconnect_delay,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// How long a dropped pub/sub subscription waits before reconnecting.
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Undecodable values are logged and treated as absent.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        let mut conn = self.connection();
        let Some(value) = conn.get::<_, Option<String>>(key).await? else {
            debug!(cache.key = %key, "Cache miss");
            return Ok(None);
        };

        match serde_json::from_str(&value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set_with_ttl<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let mut conn = self.connection();
        let json = serde_json::to_string(value)?;

        conn.set_ex::<_, _, ()>(key, json, ttl.as_secs().max(1)).await?;

        debug!(cache.key = %key, cache.ttl_secs = %ttl.as_secs(), "Cache set");
        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection();
        conn.del::<_, ()>(key).await?;
        debug!(cache.key = %key, "Cache invalidated");
        Ok(())
    }

    /// Remaining TTL in seconds. `None` when the key is missing or has no expiry.
    #[instrument(skip(self), fields(cache.operation = "TTL"))]
    pub async fn ttl(&self, key: &str) -> Result<Option<i64>, CacheError> {
        let mut conn = self.connection();
        let ttl: i64 = conn.ttl(key).await?;
        Ok((ttl > 0).then_some(ttl))
    }
}
