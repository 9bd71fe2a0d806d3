//! Request extractors that deserialize and validate in one step.
//!
//! Bodies that cannot be parsed are rejected with 400 and, when serde says
//! which field broke, a field-level error. Parsed values that fail their
//! `validator` rules are rejected with 422 and every failing field listed.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use learnmart_core::{AppError, FieldError};

const SERDE_PREFIXES: [&str; 2] = [
    "Failed to deserialize the JSON body into the target type: ",
    "Failed to deserialize query string: ",
];

fn strip_prefix(text: &str) -> &str {
    SERDE_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .unwrap_or(text)
}

fn strip_location(text: &str) -> &str {
    match text.rfind(" at line ") {
        Some(idx) => &text[..idx],
        None => text,
    }
}

/// Turns a serde error text into a field error.
///
/// `missing field `email`` becomes `email: "email is required"`, and a
/// path-prefixed error like `price: invalid type: string "x", expected i64`
/// is reported against `price`.
fn deserialize_error(text: &str) -> FieldError {
    let detail = strip_location(strip_prefix(text));

    if let Some(rest) = detail.split("missing field `").nth(1)
        && let Some(field) = rest.split('`').next()
    {
        return FieldError::new(field, format!("{} is required", field));
    }

    if let Some((path, reason)) = detail.split_once(": ")
        && !path.contains(' ')
        && !path.is_empty()
    {
        let field = path.rsplit('.').next().unwrap_or(path);
        return FieldError::new(field, format!("{} is invalid: {}", field, reason));
    }

    FieldError::general(detail.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(_) => {
                    AppError::malformed(vec![deserialize_error(&rejection.body_text())])
                }
                JsonRejection::MissingJsonContentType(_) => {
                    AppError::malformed(vec![FieldError::general(
                        "Missing 'Content-Type: application/json' header",
                    )])
                }
                _ => AppError::malformed(vec![FieldError::general("Invalid request body")]),
            })?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Query-string counterpart of [`ValidatedJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::malformed(vec![deserialize_error(&rejection.body_text())])
            })?;

        value.validate()?;

        Ok(ValidatedQuery(value))
    }
}
