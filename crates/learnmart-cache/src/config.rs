//! Redis connection configuration.

use std::env;
use std::time::Duration;

/// Loaded from environment variables.
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_PREFIX`: Prefix for all keys (default: `learnmart`)
/// - `SUBSCRIBER_RECONNECT_SECONDS`: Delay before the event subscriber reconnects (default: `5`)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub redis_url: String,
    pub key_prefix: String,
    pub reconnect_delay: Duration,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.key_prefix),
            reconnect_delay: env::var("SUBSCRIBER_RECONNECT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconnect_delay),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            key_prefix: "learnmart".into(),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}
