#![cfg(feature = "openapi")]
#![allow(dead_code)]

use petclaims_common::services::SmsResult;
use utoipa::OpenApi;

use crate::handlers::SendSmsRequest;

#[utoipa::path(
    post,
    path = "/sms/send",
    request_body = SendSmsRequest,
    responses(
        (status = 200, description = "Message accepted by the provider", body = SmsResult),
        (status = 400, description = "Phone number or message missing", body = SmsResult),
        (status = 502, description = "Provider rejected the message", body = SmsResult),
        (status = 503, description = "SMS disabled by configuration")
    ),
    tag = "SMS"
)]
fn doc_send_sms() {}

#[derive(OpenApi)]
#[openapi(
    paths(doc_send_sms),
    components(schemas(SendSmsRequest, SmsResult)),
    tags((name = "SMS", description = "Outbound text messages"))
)]
pub struct SmsApiDoc;
