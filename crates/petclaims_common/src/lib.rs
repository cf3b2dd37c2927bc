// --- File: crates/petclaims_common/src/lib.rs ---

pub mod error; // Error handling
pub mod features; // Runtime feature flags
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Shared records
pub mod routes; // Routes shared by every deployment
pub mod services; // Service abstractions

pub use routes::routes;

pub use error::{
    config_error, external_service_error, not_found, permission_denied, validation_error,
    HttpStatusCode, PetClaimsError,
};

pub use http::client::HTTP_CLIENT;

pub use logging::{init, init_stderr, init_with_level, log_error, log_result};

pub use features::{is_doses_enabled, is_feature_enabled, is_sms_enabled};
