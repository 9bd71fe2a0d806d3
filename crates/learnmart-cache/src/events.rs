//! Lecture-event pub/sub over Redis channels.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::{AsyncCommands, Client};
use tracing::{debug, info, instrument, warn};

use crate::{CacheError, RedisCache};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), CacheError>;
}

#[derive(Clone, Debug)]
pub struct RedisPublisher {
    cache: RedisCache,
}

impl RedisPublisher {
    pub fn new(cache: RedisCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    #[instrument(skip(self, payload))]
    async fn publish(&self, channel: &str, payload: String) -> Result<(), CacheError> {
        let mut conn = self.cache.connection();
        let receivers: i64 = conn.publish(channel, payload).await?;
        debug!(receivers, "Event published");
        Ok(())
    }
}

async fn consume<F, Fut>(client: &Client, channel: &str, handler: &F) -> Result<(), CacheError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(channel).await?;
    info!(channel, "Subscribed");

    let mut messages = pubsub.on_message();
    while let Some(message) = messages.next().await {
        match message.get_payload::<String>() {
            Ok(payload) => handler(payload).await,
            Err(e) => warn!(error = %e, "Dropping message with unreadable payload"),
        }
    }
    Ok(())
}

/// Subscribes to `channel` and feeds every payload to `handler`, forever.
///
/// A dropped connection or broker error is logged and retried after
/// `reconnect_delay`.
pub async fn run_subscriber<F, Fut>(
    client: Client,
    channel: String,
    reconnect_delay: Duration,
    handler: F,
) where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    loop {
        match consume(&client, &channel, &handler).await {
            Ok(()) => warn!(channel = %channel, "Subscription stream ended"),
            Err(e) => warn!(channel = %channel, error = %e, "Subscription failed"),
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}
