#![cfg(feature = "openapi")]
#![allow(dead_code)]

use utoipa::OpenApi;

use crate::handlers::DoseLinkResponse;
use crate::logic::PublicDose;

#[utoipa::path(
    get,
    path = "/doses/{token}",
    params(("token" = String, Path, description = "One-time token from the reminder link")),
    responses(
        (status = 200, description = "Link is valid", body = DoseLinkResponse),
        (status = 410, description = "Link unknown, used or expired", body = DoseLinkResponse),
        (status = 503, description = "Dose links disabled by configuration")
    ),
    tag = "Doses"
)]
fn doc_get_dose() {}

#[utoipa::path(
    post,
    path = "/doses/{token}/confirm",
    params(("token" = String, Path, description = "One-time token from the reminder link")),
    responses(
        (status = 200, description = "Dose confirmed by this request", body = DoseLinkResponse),
        (status = 410, description = "Link unknown, used or expired", body = DoseLinkResponse),
        (status = 503, description = "Dose links disabled by configuration")
    ),
    tag = "Doses"
)]
fn doc_confirm_dose() {}

#[derive(OpenApi)]
#[openapi(
    paths(doc_get_dose, doc_confirm_dose),
    components(schemas(DoseLinkResponse, PublicDose)),
    tags((name = "Doses", description = "One-time dose confirmation links"))
)]
pub struct DoseApiDoc;
