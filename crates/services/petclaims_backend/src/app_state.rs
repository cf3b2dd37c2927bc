use petclaims_common::log_result;
use petclaims_config::AppConfig;
use petclaims_db::{Capability, DbClient};
use std::sync::Arc;
use tracing::info;

use crate::service_factory::PetClaimsServiceFactory;

/// Application state that is shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,

    /// Service factory for accessing external services.
    pub service_factory: Arc<PetClaimsServiceFactory>,

    /// Opened restricted: the server only answers public requests.
    pub db: Option<DbClient>,
}

impl AppState {
    /// Build the services the configuration asks for. A database that cannot
    /// be reached is logged and left out, which disables the routes needing it.
    pub async fn new(config: Arc<AppConfig>) -> Self {
        let db = match config.database {
            Some(_) => log_result(
                DbClient::new(&config, Capability::Restricted).await,
                "Database connected",
                "Database unavailable",
            )
            .ok(),
            None => {
                info!("No database configured");
                None
            }
        };
        let service_factory = Arc::new(PetClaimsServiceFactory::new(&config));

        Self::from_parts(config, service_factory, db)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        service_factory: Arc<PetClaimsServiceFactory>,
        db: Option<DbClient>,
    ) -> Self {
        Self {
            config,
            service_factory,
            db,
        }
    }
}
