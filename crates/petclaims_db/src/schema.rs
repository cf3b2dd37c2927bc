//! Table definitions and schema probing.
//!
//! The hosted database is migrated by hand; `init_schema` exists for local
//! SQLite databases and tests. `check_schema` probes every expected column with
//! a cheap `SELECT` so it works through any driver and any credential tier.

use crate::capability::Capability;
use crate::error::DbError;
use crate::DbClient;
use serde::Serialize;
use tracing::{debug, info, warn};

/// An expected table, its columns and the DDL that creates it.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub ddl: &'static str,
}

pub const PROFILES: TableDef = TableDef {
    name: "profiles",
    columns: &["id", "email", "phone", "full_name", "sms_opt_in", "is_admin", "created_at"],
    ddl: r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            full_name TEXT,
            sms_opt_in BIGINT NOT NULL DEFAULT 0,
            is_admin BIGINT NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
    "#,
};

pub const PETS: TableDef = TableDef {
    name: "pets",
    columns: &[
        "id",
        "user_id",
        "name",
        "species",
        "insurance_company",
        "policy_number",
        "healthy_paws_pet_id",
        "pumpkin_account_number",
        "spot_account_number",
        "date_of_birth",
        "adoption_date",
        "spay_neuter_status",
    ],
    ddl: r#"
        CREATE TABLE IF NOT EXISTS pets (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            species TEXT,
            insurance_company TEXT,
            policy_number TEXT,
            healthy_paws_pet_id TEXT,
            pumpkin_account_number TEXT,
            spot_account_number TEXT,
            date_of_birth TEXT,
            adoption_date TEXT,
            spay_neuter_status TEXT
        )
    "#,
};

pub const CLAIMS: TableDef = TableDef {
    name: "claims",
    columns: &[
        "id",
        "user_id",
        "pet_id",
        "clinic_name",
        "clinic_address",
        "visit_date",
        "total_amount",
        "line_items",
        "filing_status",
        "document_url",
        "created_at",
    ],
    ddl: r#"
        CREATE TABLE IF NOT EXISTS claims (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            pet_id TEXT NOT NULL,
            clinic_name TEXT,
            clinic_address TEXT,
            visit_date TEXT,
            total_amount DOUBLE PRECISION,
            line_items TEXT NOT NULL DEFAULT '[]',
            filing_status TEXT NOT NULL DEFAULT 'draft',
            document_url TEXT,
            created_at TEXT NOT NULL
        )
    "#,
};

pub const MEDICATIONS: TableDef = TableDef {
    name: "medications",
    columns: &[
        "id",
        "user_id",
        "pet_id",
        "medication_name",
        "dosage",
        "frequency",
        "reminder_times",
        "start_date",
        "end_date",
        "created_at",
    ],
    ddl: r#"
        CREATE TABLE IF NOT EXISTS medications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            pet_id TEXT NOT NULL,
            medication_name TEXT NOT NULL,
            dosage TEXT,
            frequency TEXT,
            reminder_times TEXT NOT NULL DEFAULT '[]',
            start_date TEXT NOT NULL,
            end_date TEXT,
            created_at TEXT NOT NULL
        )
    "#,
};

pub const MEDICATION_DOSES: TableDef = TableDef {
    name: "medication_doses",
    columns: &[
        "id",
        "medication_id",
        "user_id",
        "scheduled_time",
        "status",
        "one_time_token",
        "token_expires_at",
        "short_code",
        "confirmed_at",
        "created_at",
    ],
    ddl: r#"
        CREATE TABLE IF NOT EXISTS medication_doses (
            id TEXT PRIMARY KEY,
            medication_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            scheduled_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            one_time_token TEXT NOT NULL UNIQUE,
            token_expires_at TEXT NOT NULL,
            short_code TEXT NOT NULL,
            confirmed_at TEXT,
            created_at TEXT NOT NULL
        )
    "#,
};

pub const MEDICATION_REMINDERS_LOG: TableDef = TableDef {
    name: "medication_reminders_log",
    columns: &[
        "id",
        "dose_id",
        "user_id",
        "channel",
        "sent_at",
        "success",
        "message_id",
        "error",
    ],
    ddl: r#"
        CREATE TABLE IF NOT EXISTS medication_reminders_log (
            id TEXT PRIMARY KEY,
            dose_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            channel TEXT NOT NULL,
            sent_at TEXT NOT NULL,
            success BIGINT NOT NULL DEFAULT 0,
            message_id TEXT,
            error TEXT
        )
    "#,
};

/// Every table the back office expects, in creation order.
pub const TABLES: &[TableDef] = &[
    PROFILES,
    PETS,
    CLAIMS,
    MEDICATIONS,
    MEDICATION_DOSES,
    MEDICATION_REMINDERS_LOG,
];

/// Result of probing the live database against [`TABLES`].
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SchemaReport {
    pub missing_tables: Vec<String>,
    /// `table.column` pairs on tables that do exist.
    pub missing_columns: Vec<String>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.missing_tables.is_empty() && self.missing_columns.is_empty()
    }

    /// SQL an operator can paste into the dashboard to close the gaps.
    pub fn manual_ddl(&self) -> Vec<String> {
        let mut statements: Vec<String> = TABLES
            .iter()
            .filter(|t| self.missing_tables.iter().any(|m| m == t.name))
            .map(|t| t.ddl.trim().to_string())
            .collect();
        statements.extend(self.missing_columns.iter().filter_map(|qualified| {
            qualified
                .split_once('.')
                .map(|(table, column)| format!("ALTER TABLE {} ADD COLUMN {} TEXT;", table, column))
        }));
        statements
    }
}

/// Create all tables that do not exist yet.
pub async fn init_schema(client: &DbClient) -> Result<(), DbError> {
    client.require(Capability::Elevated, "init_schema")?;
    for table in TABLES {
        debug!("Creating table {} if missing", table.name);
        client.execute(table.ddl).await?;
    }
    info!("Schema initialized ({} tables)", TABLES.len());
    Ok(())
}

/// SQLite reports these by message only; Postgres uses 42P01 and 42703.
fn is_undefined_object(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            let message = db.message().to_ascii_lowercase();
            matches!(db.code().as_deref(), Some("42P01" | "42703"))
                || message.contains("no such table")
                || message.contains("no such column")
        }
        _ => false,
    }
}

/// `Ok(false)` when the table or column is missing; other failures propagate.
async fn probe(client: &DbClient, sql: &str) -> Result<bool, DbError> {
    match sqlx::query(sql).fetch_optional(client.pool()).await {
        Ok(_) => Ok(true),
        Err(e) if is_undefined_object(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Probe the database for every expected table and column.
pub async fn check_schema(client: &DbClient) -> Result<SchemaReport, DbError> {
    let mut report = SchemaReport::default();

    for table in TABLES {
        if !probe(client, &format!("SELECT 1 FROM {} LIMIT 1", table.name)).await? {
            warn!("Table {} is missing", table.name);
            report.missing_tables.push(table.name.to_string());
            continue;
        }
        for column in table.columns {
            let sql = format!("SELECT {} FROM {} LIMIT 1", column, table.name);
            if !probe(client, &sql).await? {
                warn!("Column {}.{} is missing", table.name, column);
                report.missing_columns.push(format!("{}.{}", table.name, column));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_schema_before_and_after_init() {
        let client = DbClient::from_url("sqlite::memory:", Capability::Elevated)
            .await
            .unwrap();

        let before = check_schema(&client).await.unwrap();
        assert_eq!(before.missing_tables.len(), TABLES.len());
        assert_eq!(before.manual_ddl().len(), TABLES.len());

        init_schema(&client).await.unwrap();
        let after = check_schema(&client).await.unwrap();
        assert!(after.is_complete(), "{:?}", after);
    }

    #[tokio::test]
    async fn test_missing_column_is_reported_with_alter_statement() {
        let client = DbClient::from_url("sqlite::memory:", Capability::Elevated)
            .await
            .unwrap();
        init_schema(&client).await.unwrap();
        client.execute("DROP TABLE medication_reminders_log").await.unwrap();
        client
            .execute("CREATE TABLE medication_reminders_log (id TEXT PRIMARY KEY, dose_id TEXT, user_id TEXT, channel TEXT, sent_at TEXT, success BIGINT, message_id TEXT)")
            .await
            .unwrap();

        let report = check_schema(&client).await.unwrap();
        assert_eq!(report.missing_columns, vec!["medication_reminders_log.error".to_string()]);
        assert_eq!(
            report.manual_ddl(),
            vec!["ALTER TABLE medication_reminders_log ADD COLUMN error TEXT;".to_string()]
        );
    }

    #[tokio::test]
    async fn test_restricted_client_cannot_init_schema() {
        let client = DbClient::from_url("sqlite::memory:", Capability::Restricted)
            .await
            .unwrap();
        assert!(matches!(init_schema(&client).await, Err(DbError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_connection_failure_is_not_reported_as_missing_table() {
        let client = DbClient::from_url("sqlite::memory:", Capability::Elevated)
            .await
            .unwrap();
        init_schema(&client).await.unwrap();
        client.pool().close().await;

        assert!(matches!(
            check_schema(&client).await,
            Err(DbError::SqlxError(sqlx::Error::PoolClosed))
        ));
    }
}
