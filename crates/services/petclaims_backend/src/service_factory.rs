//! Service factory implementation.
//!
//! Builds the external services the backend uses from the configuration and
//! the enabled cargo features.

use petclaims_common::services::{ServiceFactory, SmsService};
use petclaims_config::AppConfig;
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::info;

#[cfg(feature = "sms")]
use petclaims_sms::SmsDispatcher;

#[derive(Clone, Default)]
pub struct PetClaimsServiceFactory {
    #[cfg(feature = "sms")]
    sms: Option<SmsDispatcher>,
}

impl PetClaimsServiceFactory {
    #[allow(unused_variables)]
    pub fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "sms")]
        {
            let sms = petclaims_sms::dispatcher_from_config(config);
            if sms.is_some() {
                info!("SMS dispatcher ready");
            }
            Self { sms }
        }
        #[cfg(not(feature = "sms"))]
        {
            Self::default()
        }
    }

    /// Use `dispatcher` instead of whatever the configuration describes.
    #[cfg(feature = "sms")]
    pub fn with_sms(dispatcher: Option<SmsDispatcher>) -> Self {
        Self { sms: dispatcher }
    }

    #[cfg(feature = "sms")]
    pub fn sms_dispatcher(&self) -> Option<SmsDispatcher> {
        self.sms.clone()
    }
}

impl ServiceFactory for PetClaimsServiceFactory {
    fn sms_service(&self) -> Option<Arc<dyn SmsService>> {
        #[cfg(feature = "sms")]
        {
            self.sms
                .clone()
                .map(|dispatcher| Arc::new(dispatcher) as Arc<dyn SmsService>)
        }
        #[cfg(not(feature = "sms"))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sms_without_configuration() {
        let factory = PetClaimsServiceFactory::new(&AppConfig::default());
        assert!(factory.sms_service().is_none());
    }
}
