use petclaims_common::{config_error, external_service_error, PetClaimsError};
use thiserror::Error;

/// Errors raised while talking to the SMS provider.
///
/// The dispatcher turns every one of these into a failed
/// [`petclaims_common::services::SmsResult`]; they only escape as errors from
/// the provider layer itself.
#[derive(Error, Debug)]
pub enum SmsError {
    #[error("SMS provider request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("{message}")]
    ApiError { status_code: u16, message: String },

    #[error("SMS configuration missing or incomplete: {0}")]
    ConfigError(String),

    #[error("Failed to encode request: {0}")]
    EncodingError(String),

    #[error("Unexpected provider response: {0}")]
    ResponseError(String),
}

impl From<SmsError> for PetClaimsError {
    fn from(err: SmsError) -> Self {
        match err {
            SmsError::ConfigError(msg) => config_error(msg),
            other => external_service_error("sns", other),
        }
    }
}
