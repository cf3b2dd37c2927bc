//! Feature flag handling.
//!
//! Features are switched twice: at compile time through cargo features on the
//! backend (`sms`, `doses`) and at runtime through the `use_*` flags in
//! [`AppConfig`]. The helpers here answer the runtime half.

use petclaims_config::AppConfig;

/// A feature is enabled when its flag is set and its section is present.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

/// SMS needs both `use_sms` and an `[sms]` section.
pub fn is_sms_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_sms, config.sms.as_ref())
}

/// Dose links need `use_doses` and a database to look tokens up in.
pub fn is_doses_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_doses, config.database.as_ref())
}
