//! Append-only log of reminder deliveries (`medication_reminders_log`).

use crate::capability::Capability;
use crate::error::DbError;
use crate::rows;
use crate::DbClient;
use petclaims_common::models::ReminderLogEntry;
use sqlx::any::AnyRow;
use tracing::{debug, error};

const LOG_COLUMNS: &str = "id, dose_id, user_id, channel, sent_at, success, message_id, error";

#[derive(Debug, Clone)]
pub struct SqlReminderLogRepository {
    db_client: DbClient,
}

fn entry_from_row(row: &AnyRow) -> Result<ReminderLogEntry, DbError> {
    Ok(ReminderLogEntry {
        id: rows::string(row, "id")?,
        dose_id: rows::string(row, "dose_id")?,
        user_id: rows::string(row, "user_id")?,
        channel: rows::string(row, "channel")?,
        sent_at: rows::timestamp(row, "sent_at")?,
        success: rows::boolean(row, "success")?,
        message_id: rows::opt_string(row, "message_id")?,
        error: rows::opt_string(row, "error")?,
    })
}

impl SqlReminderLogRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn record(&self, entry: ReminderLogEntry) -> Result<ReminderLogEntry, DbError> {
        self.db_client.require(Capability::Elevated, "record_reminder")?;
        debug!(
            "Recording {} reminder for dose {} (success: {})",
            entry.channel, entry.dose_id, entry.success
        );

        let query = format!(
            "INSERT INTO medication_reminders_log ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            LOG_COLUMNS
        );
        sqlx::query(&query)
            .bind(&entry.id)
            .bind(&entry.dose_id)
            .bind(&entry.user_id)
            .bind(&entry.channel)
            .bind(rows::ts(entry.sent_at))
            .bind(rows::flag(entry.success))
            .bind(entry.message_id.clone())
            .bind(entry.error.clone())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to record reminder: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(entry)
    }

    pub async fn find_by_dose(&self, dose_id: &str) -> Result<Vec<ReminderLogEntry>, DbError> {
        self.db_client.require(Capability::Elevated, "list_reminders")?;

        let query = format!(
            "SELECT {} FROM medication_reminders_log WHERE dose_id = $1 ORDER BY sent_at",
            LOG_COLUMNS
        );
        let found = sqlx::query(&query)
            .bind(dose_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        found.iter().map(entry_from_row).collect()
    }

    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64, DbError> {
        self.db_client.require(Capability::Elevated, "delete_reminders")?;

        let result = sqlx::query("DELETE FROM medication_reminders_log WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
