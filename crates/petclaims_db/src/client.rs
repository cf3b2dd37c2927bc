//! Database client
//!
//! A database-agnostic pool over SQLx's `Any` driver, tagged with the
//! [`Capability`] it was opened with.

use crate::capability::Capability;
use crate::error::DbError;
use petclaims_config::{AppConfig, DatabaseConfig};
use sqlx::pool::PoolOptions;
use sqlx::Pool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// Database client
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
    /// Credential tier this pool was opened with
    capability: Capability,
}

impl DbClient {
    /// Create a new database client from the application configuration.
    ///
    /// # Errors
    ///
    /// * The database configuration is missing
    /// * The database URL is empty
    /// * The database connection fails
    pub async fn new(config: &AppConfig, capability: Capability) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;

        Self::from_config(db_config, capability).await
    }

    /// Create a new database client from a database configuration.
    ///
    /// The restricted tier connects through `restricted_url` when one is
    /// configured, so the database's own access policy applies to it too.
    pub async fn from_config(
        db_config: &DatabaseConfig,
        capability: Capability,
    ) -> Result<Self, DbError> {
        let db_url = match (capability, db_config.restricted_url.as_deref()) {
            (Capability::Restricted, Some(url)) if !url.is_empty() => url,
            _ => db_config.url.as_str(),
        };
        if db_url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }

        Self::from_url(db_url, capability).await
    }

    /// Create a new database client from a database URL.
    pub async fn from_url(db_url: &str, capability: Capability) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }

        let pool = Self::create_pool(db_url).await?;
        info!("Database client ready ({} capability)", capability);
        Ok(Self { pool, capability })
    }

    /// Wrap an existing pool. The caller vouches for the capability.
    pub fn with_pool(pool: Pool<sqlx::Any>, capability: Capability) -> Self {
        Self { pool, capability }
    }

    /// The same pool, downgraded to another tier.
    ///
    /// Used where a server holds one pool but answers public requests.
    pub fn with_capability(&self, capability: Capability) -> Self {
        Self {
            pool: self.pool.clone(),
            capability,
        }
    }

    async fn create_pool(db_url: &str) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating database pool with URL: {}", redact(db_url));

        sqlx::any::install_default_drivers();

        let in_memory = db_url.contains(":memory:");
        // Every connection to an in-memory SQLite database sees its own empty
        // database, so those pools hold exactly one long-lived connection.
        let pool_options = if in_memory {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(Duration::from_secs(600))
        };

        if db_url.starts_with("sqlite:") && !in_memory {
            ensure_sqlite_file(db_url)?;
        }

        let pool = pool_options
            .connect_with(sqlx::any::AnyConnectOptions::from_str(db_url)?)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// The credential tier this client was opened with
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Fail with [`DbError::PermissionDenied`] unless this client may run
    /// an operation that needs `required`.
    pub fn require(&self, required: Capability, operation: &str) -> Result<(), DbError> {
        if self.capability.allows(required) {
            Ok(())
        } else {
            error!(
                "Refusing '{}' on a {} client",
                operation, self.capability
            );
            Err(DbError::PermissionDenied(operation.to_string()))
        }
    }

    /// Execute a statement that returns no rows; returns the rows affected.
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database answers a trivial query
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient({})", self.capability)
    }
}

/// Create the directory and empty file for an on-disk SQLite database.
fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
    // Handle both "sqlite:example.db" and "sqlite://example.db" formats
    let db_path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
        .unwrap_or(db_url);
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    if db_path.is_empty() {
        return Ok(());
    }

    let path = std::path::Path::new(db_path);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            debug!("Creating directory for SQLite database: {:?}", dir);
            std::fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory for SQLite database: {}", e);
                DbError::PoolError(format!("Failed to create directory: {}", e))
            })?;
        }
    }

    if !path.exists() {
        debug!("Creating empty SQLite database file: {}", db_path);
        std::fs::File::create(path).map_err(|e| {
            error!("Failed to create SQLite database file: {}", e);
            DbError::PoolError(format!("Failed to create database file: {}", e))
        })?;
    }
    Ok(())
}

/// Strip the password from a connection URL before logging it.
fn redact(db_url: &str) -> String {
    match (db_url.find("://"), db_url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let userinfo = &db_url[scheme_end + 3..at];
            let user = userinfo.split(':').next().unwrap_or("");
            format!("{}://{}:***{}", &db_url[..scheme_end], user, &db_url[at..])
        }
        _ => db_url.to_string(),
    }
}
