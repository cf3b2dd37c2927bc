use crate::capability::Capability;
use crate::error::DbError;
use crate::rows;
use crate::DbClient;
use petclaims_common::models::Claim;
use sqlx::any::AnyRow;
use tracing::error;

const CLAIM_COLUMNS: &str = "id, user_id, pet_id, clinic_name, clinic_address, visit_date, \
                             total_amount, line_items, filing_status, document_url, created_at";

/// Claim records. The back office only lists and deletes them; filing happens
/// in the web application.
#[derive(Debug, Clone)]
pub struct SqlClaimRepository {
    db_client: DbClient,
}

fn claim_from_row(row: &AnyRow) -> Result<Claim, DbError> {
    let line_items = match rows::opt_string(row, "line_items")? {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
            .map_err(|e| DbError::DecodeError(format!("line_items: {}", e)))?,
        _ => serde_json::Value::Array(Vec::new()),
    };

    Ok(Claim {
        id: rows::string(row, "id")?,
        user_id: rows::string(row, "user_id")?,
        pet_id: rows::string(row, "pet_id")?,
        clinic_name: rows::opt_string(row, "clinic_name")?,
        clinic_address: rows::opt_string(row, "clinic_address")?,
        visit_date: rows::opt_naive_date(row, "visit_date")?,
        total_amount: rows::opt_f64(row, "total_amount")?,
        line_items,
        filing_status: rows::string(row, "filing_status")?,
        document_url: rows::opt_string(row, "document_url")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

impl SqlClaimRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn create(&self, claim: Claim) -> Result<Claim, DbError> {
        self.db_client.require(Capability::Elevated, "create_claim")?;

        let query = format!(
            "INSERT INTO claims ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            CLAIM_COLUMNS
        );
        sqlx::query(&query)
            .bind(&claim.id)
            .bind(&claim.user_id)
            .bind(&claim.pet_id)
            .bind(claim.clinic_name.clone())
            .bind(claim.clinic_address.clone())
            .bind(claim.visit_date.map(rows::date))
            .bind(claim.total_amount)
            .bind(claim.line_items.to_string())
            .bind(&claim.filing_status)
            .bind(claim.document_url.clone())
            .bind(rows::ts(claim.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert claim: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(claim)
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Claim>, DbError> {
        self.db_client.require(Capability::Elevated, "list_claims")?;

        let query = format!(
            "SELECT {} FROM claims WHERE user_id = $1 ORDER BY created_at DESC",
            CLAIM_COLUMNS
        );
        let found = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list claims: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        found.iter().map(claim_from_row).collect()
    }

    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64, DbError> {
        self.db_client.require(Capability::Elevated, "delete_claims")?;

        let result = sqlx::query("DELETE FROM claims WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
