//! Environment variable handling for the back office.
//!
//! Configuration values normally arrive as `PETCLAIMS__SECTION__KEY`. The
//! hosted providers, the web client and older operator scripts use their own
//! names for the same values (`AWS_REGION`, `DATABASE_URL`, the `VITE_`-prefixed
//! client variants, ...). This module maps those names onto configuration
//! paths. They override file values; `load_config` layers the `PETCLAIMS__`
//! form on top afterwards.

use serde_json::{Map, Value};
use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "PETCLAIMS";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// Placeholder a config file may use for values that must come from the environment.
pub const SECRET_FROM_ENV: &str = "secret_from_env";

/// Well-known variable names per configuration path, in priority order.
pub const WELL_KNOWN_VARIANTS: &[(&str, &[&str])] = &[
    ("database.url", &["DATABASE_URL", "SUPABASE_DB_URL"]),
    ("sms.region", &["AWS_REGION", "AWS_SNS_REGION", "VITE_AWS_REGION"]),
    ("sms.access_key_id", &["AWS_ACCESS_KEY_ID", "VITE_AWS_ACCESS_KEY_ID"]),
    (
        "sms.secret_access_key",
        &["AWS_SECRET_ACCESS_KEY", "VITE_AWS_SECRET_ACCESS_KEY"],
    ),
    ("sms.session_token", &["AWS_SESSION_TOKEN"]),
    ("doses.public_base_url", &["PUBLIC_APP_URL", "VITE_APP_URL"]),
    ("routing.marketing_host", &["MARKETING_HOST"]),
];

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// `"sms.region"` becomes `"PETCLAIMS__SMS__REGION"`.
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Return the first non-empty value among `names`, using `lookup` to read them.
pub fn first_present<F>(names: &[&str], lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

fn get_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

fn set_path(root: &mut Value, path: &[&str], new_value: Value) {
    let mut node = root;
    for key in &path[..path.len() - 1] {
        if !node.get(*key).map(Value::is_object).unwrap_or(false) {
            if let Value::Object(map) = node {
                map.insert((*key).to_string(), Value::Object(Map::new()));
            }
        }
        node = match node.get_mut(*key) {
            Some(next) => next,
            None => return,
        };
    }
    if let (Value::Object(map), Some(last)) = (node, path.last()) {
        map.insert((*last).to_string(), new_value);
    }
}

/// Set configuration paths from their well-known variable names.
///
/// Returns the paths that were set. Paths that remain set to
/// [`SECRET_FROM_ENV`] afterwards are reported with a warning.
pub fn apply_well_known_env<F>(value: &mut Value, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut filled = Vec::new();

    for (path, names) in WELL_KNOWN_VARIANTS {
        let segments: Vec<&str> = path.split('.').collect();
        if let Some(found) = first_present(names, &lookup) {
            set_path(value, &segments, Value::String(found));
            filled.push((*path).to_string());
        } else if let Some(Value::String(s)) = get_path(value, &segments) {
            if s == SECRET_FROM_ENV {
                tracing::warn!(
                    "Config path {} is marked {} but none of {:?} is set",
                    path,
                    SECRET_FROM_ENV,
                    names
                );
            }
        }
    }

    filled
}

/// Same as [`apply_well_known_env`], reading the process environment.
pub fn apply_process_env(value: &mut Value) -> Vec<String> {
    apply_well_known_env(value, |name| env::var(name).ok())
}
