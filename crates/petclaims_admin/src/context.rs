use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use petclaims_common::services::SmsService;
use petclaims_config::AppConfig;
use petclaims_db::{Capability, DbClient};
use petclaims_doses::DoseSettings;
use std::sync::Arc;

/// Everything an operation may touch.
///
/// Built once per process. [`AdminContext::connect`] produces a copy with a
/// database client opened at the tier a given operation needs.
#[derive(Clone)]
pub struct AdminContext {
    config: Arc<AppConfig>,
    settings: DoseSettings,
    sms: Option<Arc<dyn SmsService>>,
    /// An already open pool to hand out instead of connecting.
    pool: Option<DbClient>,
    db: Option<DbClient>,
    clock: Option<DateTime<Utc>>,
}

impl AdminContext {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let settings =
            DoseSettings::from_config(&config.doses).context("Invalid dose configuration")?;
        let sms = petclaims_sms::dispatcher_from_config(&config)
            .map(|dispatcher| Arc::new(dispatcher) as Arc<dyn SmsService>);

        Ok(Self {
            config: Arc::new(config),
            settings,
            sms,
            pool: None,
            db: None,
            clock: None,
        })
    }

    /// Serve every operation from `pool` instead of `database.url`.
    pub fn with_pool(mut self, pool: DbClient) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_sms(mut self, sms: Arc<dyn SmsService>) -> Self {
        self.sms = Some(sms);
        self
    }

    pub fn with_settings(mut self, settings: DoseSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Pin "now" for every operation.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn settings(&self) -> &DoseSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// A copy of this context holding a client at `capability`, or none.
    pub async fn connect(&self, capability: Option<Capability>) -> Result<AdminContext> {
        let db = match (capability, &self.pool) {
            (None, _) => None,
            (Some(capability), Some(pool)) => {
                if !pool.capability().allows(capability) {
                    bail!("The configured pool is {}, {} is required", pool.capability(), capability);
                }
                Some(pool.with_capability(capability))
            }
            (Some(capability), None) => Some(
                DbClient::new(&self.config, capability)
                    .await
                    .context("Failed to connect to database")?,
            ),
        };

        Ok(AdminContext {
            db,
            ..self.clone()
        })
    }

    /// The client opened by [`AdminContext::connect`].
    pub fn db(&self) -> Result<&DbClient> {
        self.db
            .as_ref()
            .ok_or_else(|| anyhow!("This operation has no database connection"))
    }

    pub fn sms(&self) -> Result<&dyn SmsService> {
        self.configured_sms().ok_or_else(|| {
            anyhow!("SMS is not configured; set use_sms and the sms credentials")
        })
    }

    pub fn configured_sms(&self) -> Option<&dyn SmsService> {
        self.sms.as_deref()
    }
}
