//! SQL implementation of the dose repository

use crate::capability::Capability;
use crate::error::DbError;
use crate::repositories::dose::{Dose, DoseRepository, DoseStatus};
use crate::rows;
use crate::DbClient;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use tracing::{debug, error, info};

const DOSE_COLUMNS: &str = "id, medication_id, user_id, scheduled_time, status, one_time_token, \
                            token_expires_at, short_code, confirmed_at, created_at";

/// SQL implementation of the dose repository
#[derive(Debug, Clone)]
pub struct SqlDoseRepository {
    db_client: DbClient,
}

impl SqlDoseRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> Result<Option<Dose>, DbError> {
        let query = format!(
            "SELECT {} FROM medication_doses WHERE {}",
            DOSE_COLUMNS, clause
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to look up dose: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(dose_from_row).transpose()
    }
}

fn dose_from_row(row: &AnyRow) -> Result<Dose, DbError> {
    let status = rows::string(row, "status")?;
    Ok(Dose {
        id: rows::string(row, "id")?,
        medication_id: rows::string(row, "medication_id")?,
        user_id: rows::string(row, "user_id")?,
        scheduled_time: rows::timestamp(row, "scheduled_time")?,
        status: status
            .parse::<DoseStatus>()
            .map_err(|e| DbError::DecodeError(e.to_string()))?,
        one_time_token: rows::string(row, "one_time_token")?,
        token_expires_at: rows::timestamp(row, "token_expires_at")?,
        short_code: rows::string(row, "short_code")?,
        confirmed_at: rows::opt_timestamp(row, "confirmed_at")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

impl DoseRepository for SqlDoseRepository {
    async fn create(&self, dose: Dose) -> Result<Dose, DbError> {
        self.db_client.require(Capability::Elevated, "create_dose")?;
        debug!(
            "Creating dose for medication {} at {}",
            dose.medication_id, dose.scheduled_time
        );

        let query = r#"
            INSERT INTO medication_doses
                (id, medication_id, user_id, scheduled_time, status, one_time_token,
                 token_expires_at, short_code, confirmed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#;

        sqlx::query(query)
            .bind(&dose.id)
            .bind(&dose.medication_id)
            .bind(&dose.user_id)
            .bind(rows::ts(dose.scheduled_time))
            .bind(dose.status.as_str())
            .bind(&dose.one_time_token)
            .bind(rows::ts(dose.token_expires_at))
            .bind(&dose.short_code)
            .bind(dose.confirmed_at.map(rows::ts))
            .bind(rows::ts(dose.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert dose: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        info!("Dose {} created", dose.id);
        Ok(dose)
    }

    async fn find_pending_by_token(&self, token: &str) -> Result<Option<Dose>, DbError> {
        debug!("Looking up pending dose by token");
        self.fetch_one_where("one_time_token = $1 AND status = 'pending'", token)
            .await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Dose>, DbError> {
        self.fetch_one_where("one_time_token = $1", token).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Dose>, DbError> {
        self.db_client.require(Capability::Elevated, "find_dose_by_id")?;
        self.fetch_one_where("id = $1", id).await
    }

    async fn list_pending_for_user(&self, user_id: &str) -> Result<Vec<Dose>, DbError> {
        self.db_client
            .require(Capability::Elevated, "list_pending_doses")?;
        debug!("Listing pending doses for user {}", user_id);

        let query = format!(
            "SELECT {} FROM medication_doses WHERE user_id = $1 AND status = 'pending' \
             ORDER BY scheduled_time",
            DOSE_COLUMNS
        );
        let found = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list doses: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        found.iter().map(dose_from_row).collect()
    }

    async fn confirm_by_token(&self, token: &str, now: DateTime<Utc>) -> Result<bool, DbError> {
        let now = rows::ts(now);
        let query = r#"
            UPDATE medication_doses
            SET status = 'confirmed', confirmed_at = $1
            WHERE one_time_token = $2 AND status = 'pending' AND token_expires_at > $3
        "#;

        let result = sqlx::query(query)
            .bind(&now)
            .bind(token)
            .bind(&now)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to confirm dose: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let confirmed = result.rows_affected() > 0;
        debug!("Conditional confirm affected {} row(s)", result.rows_affected());
        Ok(confirmed)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        self.db_client.require(Capability::Elevated, "expire_stale_doses")?;

        let query = r#"
            UPDATE medication_doses
            SET status = 'expired'
            WHERE status = 'pending' AND token_expires_at <= $1
        "#;
        let result = sqlx::query(query)
            .bind(rows::ts(now))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to expire doses: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        info!("Expired {} stale dose(s)", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64, DbError> {
        self.db_client.require(Capability::Elevated, "delete_doses")?;

        let result = sqlx::query("DELETE FROM medication_doses WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete doses: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }
}
