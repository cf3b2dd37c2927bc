use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

pub mod env_vars;
pub mod models;
pub use models::*;

/// Loads the application configuration.
///
/// Sources, lowest priority first: `config/default.*`, `config/<RUN_ENV>.*`,
/// well-known provider variables (see [`env_vars::WELL_KNOWN_VARIANTS`]),
/// `PETCLAIMS__SECTION__KEY` environment variables.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    load_layered(&config_dir(), &run_env, None)
}

/// [`load_config`] against an explicit directory. With `vars` set, both
/// environment layers read from it instead of the process environment.
pub fn load_layered(
    config_dir: &Path,
    run_env: &str,
    vars: Option<HashMap<String, String>>,
) -> Result<AppConfig, ConfigError> {
    let prefix = env_vars::get_config_prefix();
    let default_path = config_dir.join("default");
    let env_path = config_dir.join(run_env);

    tracing::debug!(
        "Loading config from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let mut raw: serde_json::Value = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .build()?
        .try_deserialize()?;

    let filled = match &vars {
        Some(vars) => env_vars::apply_well_known_env(&mut raw, |name| vars.get(name).cloned()),
        None => env_vars::apply_process_env(&mut raw),
    };
    if !filled.is_empty() {
        tracing::debug!("Config paths set from provider variables: {:?}", filled);
    }

    let environment = Environment::with_prefix(&prefix)
        .prefix_separator(env_vars::CONFIG_SEPARATOR)
        .separator(env_vars::CONFIG_SEPARATOR)
        .try_parsing(true)
        .source(vars.map(|vars| vars.into_iter().collect()));

    let layered: serde_json::Value = Config::builder()
        .add_source(Config::try_from(&raw)?)
        .add_source(environment)
        .build()?
        .try_deserialize()?;

    serde_json::from_value(layered)
        .map_err(|err| ConfigError::Message(format!("invalid configuration: {err}")))
}

/// Directory holding `default.*` and the per-environment files.
pub fn config_dir() -> PathBuf {
    env::var("PETCLAIMS_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment once.
///
/// `DOTENV_OVERRIDE` names a different file; the default is `.env`. A missing
/// file is not an error. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_sane_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.doses.token_ttl_hours, 24);
        assert_eq!(config.doses.short_code_length, 6);
        assert!(!config.use_sms);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_partial_json_deserializes_with_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "use_sms": true,
            "sms": { "region": "us-east-1" },
            "routing": { "marketing_host": "learn.example.com" }
        }))
        .unwrap();
        assert!(config.use_sms);
        let sms = config.sms.unwrap();
        assert_eq!(sms.region, "us-east-1");
        assert!(sms.access_key_id.is_empty());
        assert_eq!(config.routing.marketing_host.as_deref(), Some("learn.example.com"));
        assert_eq!(config.doses.time_zone, "America/Chicago");
    }

    fn shipped_config_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config")
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_file_values_without_environment() {
        let config = load_layered(&shipped_config_dir(), "test", Some(HashMap::new())).unwrap();
        assert_eq!(config.database.unwrap().url, "sqlite:data/petclaims.db");
        assert_eq!(config.sms.unwrap().region, "us-east-1");
    }

    #[test]
    fn test_provider_variables_override_file_values() {
        let config = load_layered(
            &shipped_config_dir(),
            "test",
            Some(vars(&[
                ("DATABASE_URL", "postgres://u:p@db.hosted.example/postgres"),
                ("AWS_REGION", "eu-west-1"),
            ])),
        )
        .unwrap();
        assert_eq!(
            config.database.unwrap().url,
            "postgres://u:p@db.hosted.example/postgres"
        );
        assert_eq!(config.sms.unwrap().region, "eu-west-1");
    }

    #[test]
    fn test_prefixed_variable_beats_provider_variable() {
        let config = load_layered(
            &shipped_config_dir(),
            "test",
            Some(vars(&[
                ("AWS_REGION", "eu-west-1"),
                ("PETCLAIMS__SMS__REGION", "ap-southeast-2"),
            ])),
        )
        .unwrap();
        assert_eq!(config.sms.unwrap().region, "ap-southeast-2");
    }
}
