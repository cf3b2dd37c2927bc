use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use petclaims_common::{log_error, PetClaimsError};
use petclaims_db::SqlDoseRepository;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::logic::{confirm_dose, validate_token, ConfirmOutcome, PublicDose, TokenLookup};

/// The only message a public caller gets for an unusable link.
pub const LINK_INVALID_MESSAGE: &str = "This link is no longer valid";

/// Shared state for the dose routes. The repository is built on a
/// restricted client; `None` means the feature is switched off.
#[derive(Clone, Debug)]
pub struct DoseState {
    pub doses: Option<SqlDoseRepository>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DoseLinkResponse {
    /// `valid`, `confirmed` or `invalid`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose: Option<PublicDose>,
}

fn link_invalid() -> Response {
    (
        StatusCode::GONE,
        Json(DoseLinkResponse {
            status: "invalid".to_string(),
            message: Some(LINK_INVALID_MESSAGE.to_string()),
            dose: None,
        }),
    )
        .into_response()
}

fn disabled() -> Response {
    PetClaimsError::ServiceUnavailable("Dose links are disabled by configuration".to_string())
        .into_response()
}

/// `GET /doses/{token}`
pub async fn get_dose_handler(
    State(state): State<Arc<DoseState>>,
    Path(token): Path<String>,
) -> Response {
    let Some(doses) = state.doses.as_ref() else {
        return disabled();
    };

    match validate_token(doses, &token, Utc::now()).await {
        Ok(TokenLookup::Valid(dose)) => Json(DoseLinkResponse {
            status: "valid".to_string(),
            message: None,
            dose: Some(PublicDose::from(&dose)),
        })
        .into_response(),
        Ok(lookup) => {
            debug!(result = lookup.label(), "Public dose lookup refused");
            link_invalid()
        }
        Err(e) => {
            log_error(&e, "Dose lookup failed");
            PetClaimsError::from(e).into_response()
        }
    }
}

/// `POST /doses/{token}/confirm`
pub async fn confirm_dose_handler(
    State(state): State<Arc<DoseState>>,
    Path(token): Path<String>,
) -> Response {
    let Some(doses) = state.doses.as_ref() else {
        return disabled();
    };

    match confirm_dose(doses, &token, Utc::now()).await {
        Ok(ConfirmOutcome::Confirmed(dose)) => Json(DoseLinkResponse {
            status: "confirmed".to_string(),
            message: None,
            dose: Some(PublicDose::from(&dose)),
        })
        .into_response(),
        Ok(ConfirmOutcome::LinkInvalid) => link_invalid(),
        Err(e) => {
            log_error(&e, "Dose confirmation failed");
            PetClaimsError::from(e).into_response()
        }
    }
}
