//! sqlx error mapping for the PostgreSQL repositories.

use learnmart_core::RepoError;
use sqlx::Error as SqlxError;

pub fn map_db_error(e: SqlxError) -> RepoError {
    match e {
        SqlxError::RowNotFound => RepoError::NotFound,
        other => RepoError::Backend(other.into()),
    }
}

/// Unique violations become [`RepoError::Conflict`] with `message`.
pub fn map_unique_violation(e: SqlxError, message: &str) -> RepoError {
    if let Some(db_err) = e.as_database_error()
        && db_err.is_unique_violation()
    {
        return RepoError::Conflict(message.to_string());
    }
    map_db_error(e)
}
