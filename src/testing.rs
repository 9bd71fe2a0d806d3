//! In-memory application wiring for tests.
//!
//! [`TestApp`] builds an [`AppState`] where PostgreSQL, Redis, SMTP and the
//! broker are replaced by in-process stand-ins, and keeps handles to them so
//! tests can read OTPs, fund accounts or inspect published events.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use learnmart_auth::TokenManager;
use learnmart_cache::memory::{MemoryOtpStore, MemoryPublisher, MemorySessionStore};
use learnmart_config::{
    AppConfig, CorsConfig, EmailConfig, JwtConfig, OtpConfig, ServerConfig, StorageConfig,
};
use learnmart_db::Repositories;
use learnmart_db::memory::MemoryStore;

use crate::router::init_router;
use crate::state::AppState;
use crate::utils::email::CapturingMailer;

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            database_url: String::new(),
            redis_url: String::new(),
        },
        jwt: JwtConfig::new(
            "test-access-secret",
            "test-refresh-secret",
            "test-reset-secret",
        ),
        email: EmailConfig {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@learnmart.test".to_string(),
            from_name: "LearnMart".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
        storage: StorageConfig {
            endpoint: "https://storage.learnmart.test".to_string(),
            public_bucket: "learnmart-public".to_string(),
            private_bucket: "learnmart-private".to_string(),
            signing_key: "test-signing-key".to_string(),
            url_expiry: Duration::from_secs(900),
        },
        otp: OtpConfig::default(),
    }
}

#[derive(Clone)]
pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    pub otp_store: MemoryOtpStore,
    pub sessions: MemorySessionStore,
    pub mailer: CapturingMailer,
    pub publisher: MemoryPublisher,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let otp_store = MemoryOtpStore::new();
        let sessions = MemorySessionStore::new();
        let mailer = CapturingMailer::new();
        let publisher = MemoryPublisher::new();

        let state = AppState {
            repos: Repositories::from_memory(store.clone()),
            tokens: Arc::new(TokenManager::new(&config.jwt)),
            otp_store: Arc::new(otp_store.clone()),
            sessions: Arc::new(sessions.clone()),
            mailer: Arc::new(mailer.clone()),
            signer: Arc::new(AppState::signer_from_config(&config)),
            publisher: Arc::new(publisher.clone()),
            config: Arc::new(config),
        };

        Self {
            state,
            store,
            otp_store,
            sessions,
            mailer,
            publisher,
        }
    }

    pub fn router(&self) -> Router {
        init_router(self.state.clone())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
