use std::sync::Arc;

use anyhow::Context;
use learnmart_auth::TokenManager;
use learnmart_cache::{
    CacheConfig, EventPublisher, OtpStore, RedisCache, RedisOtpStore, RedisPublisher,
    RedisSessionStore, SessionStore,
};
use learnmart_config::AppConfig;
use learnmart_core::{HmacUrlSigner, UrlSigner};
use learnmart_db::{DatabaseConfig, Repositories, create_pool, run_migrations};

use crate::utils::email::{Mailer, SmtpMailer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repos: Repositories,
    pub tokens: Arc<TokenManager>,
    pub otp_store: Arc<dyn OtpStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub mailer: Arc<dyn Mailer>,
    pub signer: Arc<dyn UrlSigner>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn signer_from_config(config: &AppConfig) -> HmacUrlSigner {
        let storage = &config.storage;
        HmacUrlSigner::new(
            storage.endpoint.clone(),
            storage.public_bucket.clone(),
            storage.private_bucket.clone(),
            storage.signing_key.as_bytes(),
            storage.url_expiry,
        )
    }
}

/// Connects to PostgreSQL and Redis and wires every production component.
///
/// The Redis handle is returned as well so the caller can start the
/// lecture-event subscriber on the same client.
pub async fn init_app_state(config: AppConfig) -> anyhow::Result<(AppState, RedisCache)> {
    let db_config = DatabaseConfig {
        url: config.server.database_url.clone(),
        ..DatabaseConfig::from_env()
    };
    let pool = create_pool(&db_config)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let cache_config = CacheConfig {
        redis_url: config.server.redis_url.clone(),
        ..CacheConfig::from_env()
    };
    let cache = RedisCache::new(&cache_config)
        .await
        .context("Failed to connect to Redis")?;

    let mailer = SmtpMailer::new(config.email.clone())
        .context("Failed to configure mailer")?
        .with_otp_ttl(config.otp.ttl_seconds);

    let state = AppState {
        repos: Repositories::postgres(pool),
        tokens: Arc::new(TokenManager::new(&config.jwt)),
        otp_store: Arc::new(RedisOtpStore::new(cache.clone())),
        sessions: Arc::new(RedisSessionStore::new(cache.clone())),
        mailer: Arc::new(mailer),
        signer: Arc::new(AppState::signer_from_config(&config)),
        publisher: Arc::new(RedisPublisher::new(cache.clone())),
        config: Arc::new(config),
    };

    Ok((state, cache))
}
