//! Medications
//!
//! `reminder_times` is stored as a JSON array of `HH:MM` strings.

use crate::capability::Capability;
use crate::error::DbError;
use crate::rows;
use crate::DbClient;
use petclaims_common::models::Medication;
use sqlx::any::AnyRow;
use tracing::{debug, error};

const MEDICATION_COLUMNS: &str = "id, user_id, pet_id, medication_name, dosage, frequency, \
                                  reminder_times, start_date, end_date, created_at";

#[derive(Debug, Clone)]
pub struct SqlMedicationRepository {
    db_client: DbClient,
}

fn medication_from_row(row: &AnyRow) -> Result<Medication, DbError> {
    let raw_times = rows::opt_string(row, "reminder_times")?.unwrap_or_default();
    let reminder_times = if raw_times.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&raw_times)
            .map_err(|e| DbError::DecodeError(format!("reminder_times: {}", e)))?
    };

    Ok(Medication {
        id: rows::string(row, "id")?,
        user_id: rows::string(row, "user_id")?,
        pet_id: rows::string(row, "pet_id")?,
        name: rows::string(row, "medication_name")?,
        dosage: rows::opt_string(row, "dosage")?,
        frequency: rows::opt_string(row, "frequency")?,
        reminder_times,
        start_date: rows::naive_date(row, "start_date")?,
        end_date: rows::opt_naive_date(row, "end_date")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

impl SqlMedicationRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn create(&self, medication: Medication) -> Result<Medication, DbError> {
        self.db_client.require(Capability::Elevated, "create_medication")?;
        debug!("Creating medication {} for pet {}", medication.name, medication.pet_id);

        let times = serde_json::to_string(&medication.reminder_times)
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let query = r#"
            INSERT INTO medications
                (id, user_id, pet_id, medication_name, dosage, frequency,
                 reminder_times, start_date, end_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#;

        sqlx::query(query)
            .bind(&medication.id)
            .bind(&medication.user_id)
            .bind(&medication.pet_id)
            .bind(&medication.name)
            .bind(medication.dosage.clone())
            .bind(medication.frequency.clone())
            .bind(times)
            .bind(rows::date(medication.start_date))
            .bind(medication.end_date.map(rows::date))
            .bind(rows::ts(medication.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert medication: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(medication)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Medication>, DbError> {
        self.db_client.require(Capability::Elevated, "find_medication")?;

        let query = format!("SELECT {} FROM medications WHERE id = $1", MEDICATION_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find medication: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(medication_from_row).transpose()
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Medication>, DbError> {
        self.db_client.require(Capability::Elevated, "list_medications")?;

        let query = format!(
            "SELECT {} FROM medications WHERE user_id = $1 ORDER BY start_date, medication_name",
            MEDICATION_COLUMNS
        );
        let found = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list medications: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        found.iter().map(medication_from_row).collect()
    }

    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64, DbError> {
        self.db_client.require(Capability::Elevated, "delete_medications")?;

        let result = sqlx::query("DELETE FROM medications WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
