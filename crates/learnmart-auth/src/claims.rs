//! Claim structures for access, refresh and password-reset tokens.

use learnmart_models::UserRole;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const RESET_PURPOSE: &str = "password-reset";

/// Access token claims. Everything a request needs to authorize without a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessClaims {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Refresh token claims. `jti` keys the server-side session entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: Uuid,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_serialize() {
        let claims = AccessClaims {
            id: Uuid::nil(),
            email: "test@example.com".to_string(),
            role: UserRole::Instructor,
            iat: 1_700_000_000,
            exp: 1_700_000_900,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""role":"instructor""#));
        assert!(serialized.contains(r#""email":"test@example.com""#));
    }

    #[test]
    fn test_refresh_claims_require_id() {
        let json = r#"{"jti":"abc","iat":1,"exp":2}"#;
        assert!(serde_json::from_str::<RefreshClaims>(json).is_err());
    }
}
