//! Error types for the database client

use petclaims_common::{config_error, permission_denied, PetClaimsError};
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored value could not be turned back into a record
    #[error("Database decode error: {0}")]
    DecodeError(String),

    /// The client's capability does not allow the operation
    #[error("Operation '{0}' requires the elevated capability")]
    PermissionDenied(String),
}

impl From<DbError> for PetClaimsError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PermissionDenied(_) => permission_denied(err),
            DbError::ConfigError(_) | DbError::UrlError(_) => config_error(err),
            other => PetClaimsError::DatabaseError(other.to_string()),
        }
    }
}
