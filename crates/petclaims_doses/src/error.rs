use petclaims_common::{config_error, not_found, HttpStatusCode, PetClaimsError};
use petclaims_db::DbError;
use thiserror::Error;

/// Errors from the dose-token flow.
///
/// An unknown, used or expired link is not an error; it is reported through
/// [`crate::logic::TokenLookup`] and [`crate::logic::ConfirmOutcome`].
#[derive(Error, Debug)]
pub enum DoseError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Medication {0} not found")]
    MedicationNotFound(String),

    #[error("Dose {0} not found")]
    DoseNotFound(String),

    #[error("Profile {0} not found")]
    ProfileNotFound(String),

    #[error("Invalid dose configuration: {0}")]
    ConfigError(String),
}

impl From<DoseError> for PetClaimsError {
    fn from(err: DoseError) -> Self {
        match err {
            DoseError::Database(e) => e.into(),
            DoseError::MedicationNotFound(_)
            | DoseError::DoseNotFound(_)
            | DoseError::ProfileNotFound(_) => not_found(err),
            DoseError::ConfigError(msg) => config_error(msg),
        }
    }
}

impl HttpStatusCode for DoseError {
    fn status_code(&self) -> u16 {
        match self {
            DoseError::Database(DbError::PermissionDenied(_)) => 403,
            DoseError::Database(_) => 500,
            DoseError::MedicationNotFound(_)
            | DoseError::DoseNotFound(_)
            | DoseError::ProfileNotFound(_) => 404,
            DoseError::ConfigError(_) => 500,
        }
    }
}
