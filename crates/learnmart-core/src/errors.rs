//! Application error taxonomy.
//!
//! Every failure a request can hit is expressed as an [`AppError`]. The
//! mapping from error kind to HTTP status lives in one place,
//! [`AppError::status`], and the JSON shape in [`AppError::into_response`]:
//!
//! ```json
//! {
//!   "status": "error",
//!   "code": 422,
//!   "message": "Validation failed",
//!   "errors": [{ "field": "email", "message": "email must be a valid email" }]
//! }
//! ```
//!
//! Repository implementations report failures as [`RepoError`], which
//! converts into the matching [`AppError`] kind.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// A single field-level problem reported in the error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Error envelope returned for every failed request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "error")]
    pub status: &'static str,
    #[schema(example = 400)]
    pub code: u16,
    pub message: String,
    pub errors: Vec<FieldError>,
}

#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input, reported per field.
    Validation {
        status: StatusCode,
        errors: Vec<FieldError>,
    },
    /// Bad signature, expiry or claim mismatch, all reported the same way.
    InvalidToken,
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Domain-rule violation.
    BadRequest(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            errors,
        }
    }

    /// Body could not be parsed at all (bad JSON, wrong types, missing fields).
    pub fn malformed(errors: Vec<FieldError>) -> Self {
        Self::Validation {
            status: StatusCode::BAD_REQUEST,
            errors,
        }
    }

    pub fn invalid_token() -> Self {
        Self::InvalidToken
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Internal(err.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(msg.into()))
    }

    /// The error-kind → status table.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { status, .. } => *status,
            Self::InvalidToken | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to the client. Internal details never leave the process.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { .. } => "Validation failed".to_string(),
            Self::InvalidToken => "Invalid or expired token".to_string(),
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { errors, .. } => errors,
            _ => &[],
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        let errors = match self {
            Self::Validation { errors, .. } => errors.clone(),
            other => vec![FieldError::general(other.message())],
        };

        ErrorResponse {
            status: "error",
            code: self.status().as_u16(),
            message: self.message(),
            errors,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(err) => write!(f, "internal error: {err:#}"),
            Self::Validation { errors, .. } => {
                let joined = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation failed: {joined}")
            }
            other => f.write_str(&other.message()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            tracing::error!(error = ?err, "Request failed with internal error");
        }

        (self.status(), Json(self.to_response_body())).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(collect_field_errors(&errors))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::not_found("Record not found"),
            RepoError::Conflict(msg) => Self::Conflict(msg),
            RepoError::InsufficientCoins => Self::bad_request("Insufficient coin balance"),
            RepoError::Backend(err) => Self::Internal(err),
        }
    }
}

impl From<crate::storage::StorageError> for AppError {
    fn from(err: crate::storage::StorageError) -> Self {
        match err {
            crate::storage::StorageError::InvalidKey(msg) => {
                Self::malformed(vec![FieldError::new("key", msg)])
            }
            other => Self::internal(other),
        }
    }
}

/// Flattens validator output into `{field, message}` pairs, sorted by field.
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut collected: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                // struct-level checks are reported without a field
                if field.to_string() == "__all__" {
                    FieldError::general(message)
                } else {
                    FieldError::new(field.to_string(), message)
                }
            })
        })
        .collect();

    collected.sort_by(|a, b| a.field.cmp(&b.field));
    collected
}

/// Failures reported by repository implementations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("insufficient coin balance")]
    InsufficientCoins,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "email must be a valid email"))]
        email: String,
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    #[test]
    fn test_status_table() {
        assert_eq!(AppError::invalid_token().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::validation(vec![]).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::malformed(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::internal_error("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_token_message_is_generic() {
        let body = AppError::invalid_token().to_response_body();
        assert_eq!(body.status, "error");
        assert_eq!(body.code, 401);
        assert_eq!(body.message, "Invalid or expired token");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let body = AppError::internal_error("connection refused at 10.0.0.3").to_response_body();
        assert_eq!(body.message, "Internal server error");
        assert!(!serde_json::to_string(&body).unwrap().contains("10.0.0.3"));
    }

    #[test]
    fn test_validation_errors_are_collected_per_field() {
        let sample = Sample {
            email: "not-an-email".to_string(),
            name: String::new(),
        };
        let err: AppError = sample.validate().unwrap_err().into();
        let fields = err.field_errors();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field.as_deref(), Some("email"));
        assert_eq!(fields[0].message, "email must be a valid email");
        assert_eq!(fields[1].field.as_deref(), Some("name"));
    }

    #[test]
    fn test_repo_error_conversion() {
        let err: AppError = RepoError::InsufficientCoins.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = RepoError::Conflict("Email already exists".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "Email already exists");
    }

    #[test]
    fn test_error_envelope_serialization() {
        let body = AppError::bad_request("Gig has expired").to_response_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], 400);
        assert_eq!(json["errors"][0]["message"], "Gig has expired");
        assert!(json["errors"][0].get("field").is_none());
    }
}
