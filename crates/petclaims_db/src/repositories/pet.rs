//! Pets, plus the data-quality queries behind the admin repair tools.
//!
//! Older form submissions stored `""` where a value was absent. Everything
//! downstream treats `NULL` as "not provided", so the repair normalises the
//! empty strings away.

use crate::capability::Capability;
use crate::error::DbError;
use crate::rows;
use crate::DbClient;
use petclaims_common::models::Pet;
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// Optional text columns of `pets`, in display order.
pub const OPTIONAL_PET_COLUMNS: &[&str] = &[
    "species",
    "insurance_company",
    "policy_number",
    "healthy_paws_pet_id",
    "pumpkin_account_number",
    "spot_account_number",
    "date_of_birth",
    "adoption_date",
    "spay_neuter_status",
];

const PET_COLUMNS: &str = "id, user_id, name, species, insurance_company, policy_number, \
                           healthy_paws_pet_id, pumpkin_account_number, spot_account_number, \
                           date_of_birth, adoption_date, spay_neuter_status";

/// `NULL` and `""` counts for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCount {
    pub column: String,
    pub null_count: i64,
    pub empty_count: i64,
}

/// Rows touched (or that would be touched) in one column by the repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRepair {
    pub column: String,
    pub rows: u64,
}

#[derive(Debug, Clone)]
pub struct SqlPetRepository {
    db_client: DbClient,
}

fn pet_from_row(row: &AnyRow) -> Result<Pet, DbError> {
    // Blank optional text reads back as absent.
    let text = |column: &str| -> Result<Option<String>, DbError> {
        Ok(rows::opt_string(row, column)?.filter(|s| !s.is_empty()))
    };

    Ok(Pet {
        id: rows::string(row, "id")?,
        user_id: rows::string(row, "user_id")?,
        name: rows::string(row, "name")?,
        species: text("species")?,
        insurance_company: text("insurance_company")?,
        policy_number: text("policy_number")?,
        healthy_paws_pet_id: text("healthy_paws_pet_id")?,
        pumpkin_account_number: text("pumpkin_account_number")?,
        spot_account_number: text("spot_account_number")?,
        date_of_birth: rows::opt_naive_date(row, "date_of_birth")?,
        adoption_date: rows::opt_naive_date(row, "adoption_date")?,
        spay_neuter_status: text("spay_neuter_status")?,
    })
}

impl SqlPetRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn create(&self, pet: Pet) -> Result<Pet, DbError> {
        self.db_client.require(Capability::Elevated, "create_pet")?;

        let query = format!(
            "INSERT INTO pets ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            PET_COLUMNS
        );
        sqlx::query(&query)
            .bind(&pet.id)
            .bind(&pet.user_id)
            .bind(&pet.name)
            .bind(pet.species.clone())
            .bind(pet.insurance_company.clone())
            .bind(pet.policy_number.clone())
            .bind(pet.healthy_paws_pet_id.clone())
            .bind(pet.pumpkin_account_number.clone())
            .bind(pet.spot_account_number.clone())
            .bind(pet.date_of_birth.map(rows::date))
            .bind(pet.adoption_date.map(rows::date))
            .bind(pet.spay_neuter_status.clone())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert pet: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(pet)
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Pet>, DbError> {
        self.db_client.require(Capability::Elevated, "list_pets")?;

        let query = format!(
            "SELECT {} FROM pets WHERE user_id = $1 ORDER BY name",
            PET_COLUMNS
        );
        let found = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list pets: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        found.iter().map(pet_from_row).collect()
    }

    async fn count(&self, sql: &str) -> Result<i64, DbError> {
        let row = sqlx::query(sql)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.try_get::<i64, _>("n")
            .map_err(|e| DbError::DecodeError(e.to_string()))
    }

    /// `NULL` vs `""` counts for every optional column.
    pub async fn field_counts(&self) -> Result<Vec<FieldCount>, DbError> {
        self.db_client.require(Capability::Elevated, "find_null_fields")?;

        let mut counts = Vec::with_capacity(OPTIONAL_PET_COLUMNS.len());
        for column in OPTIONAL_PET_COLUMNS {
            let null_count = self
                .count(&format!("SELECT COUNT(*) AS n FROM pets WHERE {} IS NULL", column))
                .await?;
            let empty_count = self
                .count(&format!("SELECT COUNT(*) AS n FROM pets WHERE {} = ''", column))
                .await?;
            debug!("pets.{}: {} null, {} empty", column, null_count, empty_count);
            counts.push(FieldCount {
                column: column.to_string(),
                null_count,
                empty_count,
            });
        }
        Ok(counts)
    }

    /// Set `""` to `NULL` in every optional column. With `dry_run` nothing is
    /// written and the result reports what would change.
    pub async fn repair_empty_strings(&self, dry_run: bool) -> Result<Vec<FieldRepair>, DbError> {
        self.db_client
            .require(Capability::Elevated, "repair_empty_strings")?;

        let mut repairs = Vec::new();
        for column in OPTIONAL_PET_COLUMNS {
            let affected = if dry_run {
                let n = self
                    .count(&format!("SELECT COUNT(*) AS n FROM pets WHERE {} = ''", column))
                    .await?;
                u64::try_from(n).unwrap_or(0)
            } else {
                self.db_client
                    .execute(&format!(
                        "UPDATE pets SET {col} = NULL WHERE {col} = ''",
                        col = column
                    ))
                    .await?
            };
            if affected > 0 {
                repairs.push(FieldRepair {
                    column: column.to_string(),
                    rows: affected,
                });
            }
        }

        let total: u64 = repairs.iter().map(|r| r.rows).sum();
        if dry_run {
            info!("Dry run: {} empty value(s) would be cleared", total);
        } else {
            info!("Cleared {} empty value(s)", total);
        }
        Ok(repairs)
    }

    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64, DbError> {
        self.db_client.require(Capability::Elevated, "delete_pets")?;

        let result = sqlx::query("DELETE FROM pets WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
