use std::env;
use std::time::Duration;

use crate::ConfigError;

#[derive(Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub public_bucket: String,
    pub private_bucket: String,
    pub signing_key: String,
    pub url_expiry: Duration,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("public_bucket", &self.public_bucket)
            .field("private_bucket", &self.private_bucket)
            .field("url_expiry", &self.url_expiry)
            .finish_non_exhaustive()
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("STORAGE_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            public_bucket: env::var("STORAGE_PUBLIC_BUCKET")
                .unwrap_or_else(|_| "learnmart-public".to_string()),
            private_bucket: env::var("STORAGE_PRIVATE_BUCKET")
                .unwrap_or_else(|_| "learnmart-private".to_string()),
            signing_key: env::var("STORAGE_SIGNING_KEY").unwrap_or_default(),
            url_expiry: Duration::from_secs(
                env::var("STORAGE_URL_EXPIRY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15 * 60),
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_key.trim().is_empty() {
            return Err(ConfigError::EmptySecret("STORAGE_SIGNING_KEY"));
        }
        if self.url_expiry.is_zero() {
            return Err(ConfigError::NotPositive("STORAGE_URL_EXPIRY"));
        }
        Ok(())
    }
}
