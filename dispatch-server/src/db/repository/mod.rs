//! Repository Module
//!
//! Plain-function data access over the SQLite pool. Row structs handle the
//! TEXT-column encodings (UUIDs, enums, RFC 3339 timestamps) and convert at
//! the boundary so domain types stay free of storage details.

pub mod order;
pub mod product;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

pub(crate) fn parse_uuid(s: &str, what: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(s).map_err(|_| RepoError::Database(format!("Corrupt {what} uuid: {s}")))
}
