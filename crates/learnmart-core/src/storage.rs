//! Signed URL generation for object storage.
//!
//! Clients never stream file bytes through the API. Instead they ask for a
//! short-lived URL and talk to the storage endpoint directly. Each URL
//! carries its method, expiry and (for uploads) content type, all covered
//! by an HMAC-SHA256 signature the storage gateway recomputes:
//!
//! ```text
//! {endpoint}/{bucket}/{key}?X-Method=PUT&X-Expires=1700000000&X-Content-Type=video%2Fmp4&X-Signature=<hex>
//! ```
//!
//! The string to sign is `method \n bucket \n key \n content_type \n expires`.
//!
//! # Example
//!
//! ```ignore
//! use learnmart_core::storage::{HmacUrlSigner, SignedUrlRequest, UrlSigner};
//!
//! let signer = HmacUrlSigner::new(endpoint, "public", "private", key, Duration::from_secs(900));
//! let url = signer.sign_upload(&SignedUrlRequest::new("lectures/intro.mp4"))?;
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const TEMP_PREFIX: &str = "tmp/";
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Invalid storage endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Signing key rejected")]
    InvalidSigningKey,
}

/// What the caller wants to put into storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlRequest {
    pub key: String,
    pub content_type: Option<String>,
    pub is_public: bool,
    pub is_temp: bool,
}

impl SignedUrlRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content_type: None,
            is_public: false,
            is_temp: false,
        }
    }
}

/// Produces pre-authorized storage URLs.
///
/// Implementations must be cheap to call; no network I/O happens here.
pub trait UrlSigner: Send + Sync {
    fn sign_upload(&self, request: &SignedUrlRequest) -> Result<String, StorageError>;

    fn sign_download(&self, key: &str, is_public: bool) -> Result<String, StorageError>;
}

/// Normalizes an object key.
///
/// Leading slashes and empty segments are dropped. Keys that are empty,
/// contain `.`/`..` segments, backslashes or control characters are rejected.
pub fn sanitize_key(raw: &str) -> Result<String, StorageError> {
    let trimmed = raw.trim();
    if trimmed.contains('\\') || trimmed.chars().any(char::is_control) {
        return Err(StorageError::InvalidKey(
            "key contains forbidden characters".to_string(),
        ));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(StorageError::InvalidKey(
                "key must not contain relative path segments".to_string(),
            ));
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".to_string()));
    }

    Ok(segments.join("/"))
}

/// Namespace every upload of `user_id` lands in: `users/{id}/`.
pub fn user_prefix(user_id: Uuid) -> String {
    format!("users/{user_id}/")
}

/// Whether an already sanitized key lies in the user's namespace.
/// Temp uploads (`tmp/users/{id}/...`) count.
pub fn is_owned_key(user_id: Uuid, key: &str) -> bool {
    let key = key.strip_prefix(TEMP_PREFIX).unwrap_or(key);
    key.starts_with(&user_prefix(user_id))
}

/// Sanitizes `raw` and moves it under the user's namespace unless it is
/// already there.
pub fn scope_key(user_id: Uuid, raw: &str) -> Result<String, StorageError> {
    let key = sanitize_key(raw)?;
    if is_owned_key(user_id, &key) {
        return Ok(key);
    }
    Ok(format!("{}{key}", user_prefix(user_id)))
}

#[derive(Clone)]
pub struct HmacUrlSigner {
    endpoint: String,
    public_bucket: String,
    private_bucket: String,
    signing_key: Vec<u8>,
    expiry: Duration,
}

impl HmacUrlSigner {
    pub fn new(
        endpoint: impl Into<String>,
        public_bucket: impl Into<String>,
        private_bucket: impl Into<String>,
        signing_key: impl AsRef<[u8]>,
        expiry: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            public_bucket: public_bucket.into(),
            private_bucket: private_bucket.into(),
            signing_key: signing_key.as_ref().to_vec(),
            expiry,
        }
    }

    fn bucket(&self, is_public: bool) -> &str {
        if is_public {
            &self.public_bucket
        } else {
            &self.private_bucket
        }
    }

    fn signature(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires: i64,
    ) -> Result<String, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|_| StorageError::InvalidSigningKey)?;
        let payload = format!("{method}\n{bucket}\n{key}\n{content_type}\n{expires}");
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks a signature produced by this signer. Expiry is checked against `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_signature(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.signing_key) else {
            return false;
        };
        let payload = format!("{method}\n{bucket}\n{key}\n{content_type}\n{expires}");
        mac.update(payload.as_bytes());
        mac.verify_slice(&provided).is_ok()
    }

    fn build_url(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let expires = now.timestamp() + self.expiry.as_secs() as i64;
        let signature = self.signature(method, bucket, key, content_type.unwrap_or(""), expires)?;

        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| StorageError::InvalidEndpoint(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidEndpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .push(bucket)
            .extend(key.split('/'));

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("X-Method", method);
            query.append_pair("X-Expires", &expires.to_string());
            if let Some(content_type) = content_type {
                query.append_pair("X-Content-Type", content_type);
            }
            query.append_pair("X-Signature", &signature);
        }

        Ok(url.into())
    }

    pub fn sign_upload_at(
        &self,
        request: &SignedUrlRequest,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let mut key = sanitize_key(&request.key)?;
        if request.is_temp && !key.starts_with(TEMP_PREFIX) {
            key = format!("{TEMP_PREFIX}{key}");
        }
        let content_type = request
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty());

        self.build_url("PUT", self.bucket(request.is_public), &key, content_type, now)
    }

    pub fn sign_download_at(
        &self,
        key: &str,
        is_public: bool,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let key = sanitize_key(key)?;
        self.build_url("GET", self.bucket(is_public), &key, None, now)
    }
}

impl UrlSigner for HmacUrlSigner {
    fn sign_upload(&self, request: &SignedUrlRequest) -> Result<String, StorageError> {
        self.sign_upload_at(request, Utc::now())
    }

    fn sign_download(&self, key: &str, is_public: bool) -> Result<String, StorageError> {
        self.sign_download_at(key, is_public, Utc::now())
    }
}
