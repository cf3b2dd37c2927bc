//! Phone normalization and outbound SMS.
//!
//! [`SmsDispatcher`] is the entry point: it normalizes the number, rejects
//! empty input and publishes through an [`SmsPublisher`]. [`SnsPublisher`] is
//! the production publisher.

pub mod doc;
pub mod error;
pub mod handlers;
pub mod phone;
pub mod routes;
pub mod service;
pub mod sigv4;
pub mod sns;

pub use error::SmsError;
pub use phone::format_phone_to_e164;
pub use routes::{dispatcher_from_config, routes, routes_with_dispatcher};
pub use service::{SmsDispatcher, SmsPublisher};
pub use sns::SnsPublisher;
