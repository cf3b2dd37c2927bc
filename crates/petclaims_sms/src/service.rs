use petclaims_common::services::{BoxFuture, BoxOutcome, SmsResult, SmsService, MISSING_SMS_INPUT};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::SmsError;
use crate::phone::format_phone_to_e164;

/// The provider side of a send: deliver one message to one E.164 number and
/// return the provider's message id.
pub trait SmsPublisher: Send + Sync {
    fn publish<'a>(&'a self, phone_number: &'a str, message: &'a str)
        -> BoxFuture<'a, String, SmsError>;
}

/// Normalizes, validates and hands one message to the publisher.
///
/// Exactly one publish call per send, no retries. Every outcome, including
/// provider failures, comes back as an [`SmsResult`].
#[derive(Clone)]
pub struct SmsDispatcher {
    publisher: Arc<dyn SmsPublisher>,
}

impl SmsDispatcher {
    pub fn new(publisher: Arc<dyn SmsPublisher>) -> Self {
        Self { publisher }
    }

    pub async fn send_sms(&self, phone: &str, message: &str) -> SmsResult {
        let phone_number = format_phone_to_e164(phone);

        if phone_number.trim().is_empty() || message.trim().is_empty() {
            warn!(phone = %phone_number, "Refusing to send SMS: {}", MISSING_SMS_INPUT);
            return SmsResult::failed(phone_number, MISSING_SMS_INPUT);
        }

        info!(phone = %phone_number, length = message.len(), "Sending SMS");

        match self.publisher.publish(&phone_number, message).await {
            Ok(message_id) => {
                info!(phone = %phone_number, message_id = %message_id, "SMS sent");
                SmsResult::sent(phone_number, message_id)
            }
            Err(e) => {
                error!(phone = %phone_number, error = %e, "SMS send failed");
                SmsResult::failed(phone_number, e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for SmsDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsDispatcher").finish_non_exhaustive()
    }
}

impl SmsService for SmsDispatcher {
    fn send_sms(&self, to: &str, body: &str) -> BoxOutcome<'_, SmsResult> {
        let to = to.to_string();
        let body = body.to_string();
        Box::pin(async move { SmsDispatcher::send_sms(self, &to, &body).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and answers with a canned result.
    #[derive(Default)]
    struct FakePublisher {
        calls: Mutex<Vec<(String, String)>>,
        fail_with: Option<String>,
    }

    impl SmsPublisher for FakePublisher {
        fn publish<'a>(
            &'a self,
            phone_number: &'a str,
            message: &'a str,
        ) -> BoxFuture<'a, String, SmsError> {
            self.calls
                .lock()
                .unwrap()
                .push((phone_number.to_string(), message.to_string()));
            let outcome = match &self.fail_with {
                Some(message) => Err(SmsError::ApiError {
                    status_code: 400,
                    message: message.clone(),
                }),
                None => Ok("msg-123".to_string()),
            };
            Box::pin(async move { outcome })
        }
    }

    fn dispatcher(publisher: Arc<FakePublisher>) -> SmsDispatcher {
        SmsDispatcher::new(publisher)
    }

    #[tokio::test]
    async fn test_empty_message_never_reaches_provider() {
        let publisher = Arc::new(FakePublisher::default());
        let result = dispatcher(publisher.clone()).send_sms("312 305 0403", "").await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(MISSING_SMS_INPUT));
        assert_eq!(result.phone_number, "+13123050403");
        assert!(publisher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_phone_never_reaches_provider() {
        let publisher = Arc::new(FakePublisher::default());
        let result = dispatcher(publisher.clone()).send_sms("", "hello").await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(MISSING_SMS_INPUT));
        assert!(publisher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_send_normalizes_once() {
        let publisher = Arc::new(FakePublisher::default());
        let result = dispatcher(publisher.clone())
            .send_sms("(312) 305-0403", "Time for Apoquel")
            .await;

        assert!(result.success);
        assert_eq!(result.message_id.as_deref(), Some("msg-123"));
        assert_eq!(
            *publisher.calls.lock().unwrap(),
            vec![("+13123050403".to_string(), "Time for Apoquel".to_string())]
        );
    }

    #[tokio::test]
    async fn test_provider_error_is_returned_as_failure() {
        let publisher = Arc::new(FakePublisher {
            fail_with: Some("Invalid parameter: PhoneNumber".to_string()),
            ..FakePublisher::default()
        });
        let result = dispatcher(publisher.clone()).send_sms("123", "hello").await;

        assert!(!result.success);
        assert_eq!(result.phone_number, "123");
        assert_eq!(result.error.as_deref(), Some("Invalid parameter: PhoneNumber"));
        assert_eq!(publisher.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatcher_behind_the_service_trait() {
        let service: Arc<dyn SmsService> = Arc::new(dispatcher(Arc::new(FakePublisher::default())));
        let result = service.send_sms("3123050403", "hi").await;
        assert!(result.success);
    }
}
