use axum::{
    routing::{get, post},
    Router,
};
use petclaims_common::is_doses_enabled;
use petclaims_config::AppConfig;
use petclaims_db::{Capability, DbClient, SqlDoseRepository};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{confirm_dose_handler, get_dose_handler, DoseState};

/// Creates a router containing all routes for the dose-link feature.
///
/// Whatever tier `db` was opened with, the routes only ever see a restricted
/// view of it.
pub fn routes(config: Arc<AppConfig>, db: Option<DbClient>) -> Router {
    let doses = match db {
        Some(db) if is_doses_enabled(&config) => Some(SqlDoseRepository::new(
            db.with_capability(Capability::Restricted),
        )),
        _ => {
            info!("Dose links disabled by configuration");
            None
        }
    };
    routes_with_repository(doses)
}

pub fn routes_with_repository(doses: Option<SqlDoseRepository>) -> Router {
    let state = Arc::new(DoseState { doses });
    Router::new()
        .route("/doses/{token}", get(get_dose_handler))
        .route("/doses/{token}/confirm", post(confirm_dose_handler))
        .with_state(state)
}
