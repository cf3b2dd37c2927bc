// --- File: crates/petclaims_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! Crates that need to notify a user depend on these traits instead of a
//! concrete provider, which keeps the provider swappable and testable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Type alias for a boxed future whose output already encodes failure
pub type BoxOutcome<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error message returned when a send is attempted without a destination or body.
pub const MISSING_SMS_INPUT: &str = "Missing phoneNumber or message";

/// Outcome of a single SMS send attempt.
///
/// Sending never fails with an error; callers check `success` and `error`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SmsResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub phone_number: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SmsResult {
    /// A successful send with the provider's message id.
    pub fn sent(phone_number: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            phone_number: phone_number.into(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// A failed send carrying the reason.
    pub fn failed(phone_number: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            phone_number: phone_number.into(),
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// A trait for outbound SMS.
pub trait SmsService: Send + Sync {
    /// Send one SMS. Implementations never panic or return an error; every
    /// failure is reported through [`SmsResult`].
    fn send_sms(&self, to: &str, body: &str) -> BoxOutcome<'_, SmsResult>;
}

/// A factory for creating service instances.
pub trait ServiceFactory: Send + Sync {
    /// Get an SMS service instance, if SMS is enabled and configured.
    fn sms_service(&self) -> Option<Arc<dyn SmsService>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_serializes_error() {
        let result = SmsResult::failed("", MISSING_SMS_INPUT);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["messageId"], serde_json::Value::Null);
        assert_eq!(json["phoneNumber"], "");
        assert_eq!(json["error"], "Missing phoneNumber or message");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_sent_result_omits_error() {
        let result = SmsResult::sent("+13123050403", "abc-123");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["messageId"], "abc-123");
        assert!(json.get("error").is_none());
    }
}
