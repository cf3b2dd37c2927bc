use petclaims_config::SmsConfig;
use petclaims_sms::{SmsDispatcher, SnsPublisher};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SmsConfig {
    SmsConfig {
        region: "us-east-1".to_string(),
        access_key_id: "AKIDEXAMPLE".to_string(),
        secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
        endpoint: Some(format!("{}/", server.uri())),
        ..SmsConfig::default()
    }
}

#[tokio::test]
async fn test_publish_reads_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(body_string_contains("Action=Publish"))
        .and(body_string_contains("PhoneNumber=%2B13123050403"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<PublishResponse><PublishResult><MessageId>5b4c-11</MessageId></PublishResult></PublishResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = SnsPublisher::from_config(&config_for(&server)).unwrap();
    let result = SmsDispatcher::new(Arc::new(publisher))
        .send_sms("312 305 0403", "Time for Apoquel")
        .await;

    assert!(result.success, "{:?}", result);
    assert_eq!(result.message_id.as_deref(), Some("5b4c-11"));
}

#[tokio::test]
async fn test_provider_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            "<ErrorResponse><Error><Type>Sender</Type><Code>InvalidParameter</Code>\
             <Message>Invalid parameter: PhoneNumber Reason: +123 is not valid to publish to</Message>\
             </Error></ErrorResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = SnsPublisher::from_config(&config_for(&server)).unwrap();
    let result = SmsDispatcher::new(Arc::new(publisher))
        .send_sms("+123", "hello")
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Invalid parameter: PhoneNumber Reason: +123 is not valid to publish to")
    );
}
