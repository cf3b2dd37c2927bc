use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use petclaims_common::services::{SmsResult, MISSING_SMS_INPUT};
use petclaims_common::PetClaimsError;
use serde::Deserialize;
use std::sync::Arc;

use crate::service::SmsDispatcher;

/// Shared state for the SMS routes. `dispatcher` is `None` when SMS is
/// switched off or not configured.
#[derive(Clone, Debug)]
pub struct SmsState {
    pub dispatcher: Option<SmsDispatcher>,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct SendSmsRequest {
    #[cfg_attr(feature = "openapi", schema(example = "(312) 305-0403"))]
    pub phone_number: String,
    #[cfg_attr(feature = "openapi", schema(example = "Time for Biscuit's Apoquel"))]
    pub message: String,
}

/// `POST /sms/send`
///
/// The body is always an [`SmsResult`]; the status tells a missing input
/// (400) apart from a provider failure (502).
pub async fn send_sms_handler(
    State(state): State<Arc<SmsState>>,
    Json(request): Json<SendSmsRequest>,
) -> Response {
    let Some(dispatcher) = state.dispatcher.as_ref() else {
        return PetClaimsError::ServiceUnavailable("SMS is disabled by configuration".to_string())
            .into_response();
    };

    let result = dispatcher
        .send_sms(&request.phone_number, &request.message)
        .await;
    (status_for(&result), Json(result)).into_response()
}

fn status_for(result: &SmsResult) -> StatusCode {
    match (result.success, result.error.as_deref()) {
        (true, _) => StatusCode::OK,
        (false, Some(MISSING_SMS_INPUT)) => StatusCode::BAD_REQUEST,
        (false, _) => StatusCode::BAD_GATEWAY,
    }
}
