use std::fmt;
use thiserror::Error;

/// The base error type shared by all back-office crates.
///
/// Each crate keeps its own error enum and implements `From<SpecificError>`
/// for `PetClaimsError` at the boundary where errors leave the crate.
#[derive(Error, Debug)]
pub enum PetClaimsError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The credential tier in use may not perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Feature switched off by configuration
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for PetClaimsError {
    fn status_code(&self) -> u16 {
        match self {
            PetClaimsError::ConfigError(_) => 500,
            PetClaimsError::PermissionDenied(_) => 403,
            PetClaimsError::ValidationError(_) => 400,
            PetClaimsError::DatabaseError(_) => 500,
            PetClaimsError::ExternalServiceError { .. } => 502,
            PetClaimsError::NotFoundError(_) => 404,
            PetClaimsError::ServiceUnavailable(_) => 503,
        }
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> PetClaimsError {
    PetClaimsError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> PetClaimsError {
    PetClaimsError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> PetClaimsError {
    PetClaimsError::NotFoundError(message.to_string())
}

pub fn permission_denied<T: fmt::Display>(message: T) -> PetClaimsError {
    PetClaimsError::PermissionDenied(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> PetClaimsError {
    PetClaimsError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}
