use axum::{extract::State, middleware, routing::get, Json, Router};
use petclaims_common::services::ServiceFactory;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::host_routing::{host_routing_middleware, HostRoutingState};

#[derive(Serialize, Debug)]
struct StatusResponse {
    sms: bool,
    doses: bool,
    database: bool,
}

/// Which features this deployment is actually serving.
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let database = match &state.db {
        Some(db) => db.is_healthy().await,
        None => false,
    };
    Json(StatusResponse {
        sms: state.service_factory.sms_service().is_some(),
        doses: cfg!(feature = "doses")
            && petclaims_common::is_doses_enabled(&state.config)
            && state.db.is_some(),
        database,
    })
}

/// The whole application: `/api` routes behind the host-routing middleware.
pub fn build_router(state: AppState) -> Router {
    #[allow(unused_mut)]
    let mut api = petclaims_common::routes().merge(
        Router::new()
            .route("/status", get(status))
            .with_state(state.clone()),
    );

    #[cfg(feature = "sms")]
    {
        api = api.merge(petclaims_sms::routes_with_dispatcher(
            state.service_factory.sms_dispatcher(),
        ));
    }
    #[cfg(feature = "doses")]
    {
        api = api.merge(petclaims_doses::routes(state.config.clone(), state.db.clone()));
    }

    #[allow(unused_mut)]
    let mut app = Router::new().nest("/api", api);

    #[cfg(feature = "openapi")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "PetClaims API",
                version = "0.1.0",
                description = "PetClaims back office API"
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        #[allow(unused_mut)]
        let mut openapi_doc = ApiDoc::openapi();
        #[cfg(feature = "sms")]
        openapi_doc.merge(petclaims_sms::doc::SmsApiDoc::openapi());
        #[cfg(feature = "doses")]
        openapi_doc.merge(petclaims_doses::doc::DoseApiDoc::openapi());

        tracing::info!("Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let host_state = Arc::new(HostRoutingState::from_config(&state.config.routing));
    app.layer(middleware::from_fn_with_state(
        host_state,
        host_routing_middleware,
    ))
    .layer(TraceLayer::new_for_http())
}
