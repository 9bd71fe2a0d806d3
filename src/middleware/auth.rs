use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use learnmart_auth::AccessClaims;
use learnmart_core::AppError;
use learnmart_models::UserRole;

use crate::state::AppState;

/// Extractor that verifies the access token and provides its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessClaims);

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.0.id
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }

    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.0.role)
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid authorization header format"))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let claims = state.tokens.verify_access_token(token)?;

        Ok(AuthUser(claims))
    }
}

/// Like [`AuthUser`] for routes that are public but personalize their output.
///
/// A missing header yields `None`; a present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers)? {
            Some(token) => {
                let claims = state.tokens.verify_access_token(token)?;
                Ok(MaybeAuthUser(Some(AuthUser(claims))))
            }
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

/// Creates an extractor that only lets the listed roles through.
#[macro_export]
macro_rules! require_role {
    ($name:ident, $label:literal, [$($role:expr),+ $(,)?]) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = learnmart_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;

                if !auth_user.has_any_role(&[$($role),+]) {
                    return Err(learnmart_core::AppError::forbidden(format!(
                        "Access denied. {} role required",
                        $label
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireAdmin, "Admin", [UserRole::Admin]);
require_role!(
    RequireInstructor,
    "Instructor",
    [UserRole::Instructor, UserRole::Admin]
);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).unwrap().is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn test_role_helpers() {
        let user = AuthUser(AccessClaims {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            role: UserRole::Instructor,
            iat: 0,
            exp: 0,
        });
        assert!(!user.is_admin());
        assert!(user.has_any_role(&[UserRole::Instructor, UserRole::Admin]));
        assert!(!user.has_any_role(&[UserRole::Admin]));
    }
}
