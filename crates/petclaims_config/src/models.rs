// --- File: crates/petclaims_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // PETCLAIMS__DATABASE__URL, DATABASE_URL or SUPABASE_DB_URL
    /// Connection used by the restricted tier; falls back to `url` when unset.
    #[serde(default)]
    pub restricted_url: Option<String>,
}

// --- SMS Config ---
// Credentials for the cloud notification publish API.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SmsConfig {
    pub region: String,            // AWS_REGION
    pub access_key_id: String,     // AWS_ACCESS_KEY_ID
    pub secret_access_key: String, // AWS_SECRET_ACCESS_KEY
    pub session_token: Option<String>, // AWS_SESSION_TOKEN
    pub sender_id: Option<String>,
    /// Overrides `https://sns.<region>.amazonaws.com/`, mostly for local stubs.
    pub endpoint: Option<String>,
}

// --- Dose Token Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DoseConfig {
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_short_code_length")]
    pub short_code_length: usize,
    /// Base URL the confirmation links point at (PUBLIC_APP_URL).
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// IANA zone used to decide which calendar day "today" is.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_short_code_length() -> usize {
    6
}

fn default_public_base_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_time_zone() -> String {
    "America/Chicago".to_string()
}

impl Default for DoseConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
            short_code_length: default_short_code_length(),
            public_base_url: default_public_base_url(),
            time_zone: default_time_zone(),
        }
    }
}

// --- Host Routing Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RoutingConfig {
    /// Host that receives the bundled marketing page instead of the app.
    #[serde(default)]
    pub marketing_host: Option<String>,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_sms: bool,
    #[serde(default)]
    pub use_doses: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub sms: Option<SmsConfig>,
    #[serde(default)]
    pub doses: DoseConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}
