use axum::{routing::post, Router};
use petclaims_common::is_sms_enabled;
use petclaims_config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};

use crate::handlers::{send_sms_handler, SmsState};
use crate::service::SmsDispatcher;
use crate::sns::SnsPublisher;

/// Build the SNS-backed dispatcher if SMS is enabled and fully configured.
pub fn dispatcher_from_config(config: &AppConfig) -> Option<SmsDispatcher> {
    if !is_sms_enabled(config) {
        info!("SMS disabled by configuration");
        return None;
    }
    let sms_config = config.sms.as_ref()?;
    match SnsPublisher::from_config(sms_config) {
        Ok(publisher) => Some(SmsDispatcher::new(Arc::new(publisher))),
        Err(e) => {
            warn!("SMS enabled but not usable: {}", e);
            None
        }
    }
}

/// Creates a router containing all routes for the SMS feature.
pub fn routes(config: Arc<AppConfig>) -> Router {
    routes_with_dispatcher(dispatcher_from_config(&config))
}

/// Same routes around an already-built dispatcher.
pub fn routes_with_dispatcher(dispatcher: Option<SmsDispatcher>) -> Router {
    let state = Arc::new(SmsState { dispatcher });
    Router::new()
        .route("/sms/send", post(send_sms_handler))
        .with_state(state)
}
