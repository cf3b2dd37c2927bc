use crate::capability::Capability;
use crate::error::DbError;
use crate::rows;
use crate::DbClient;
use petclaims_common::models::Profile;
use sqlx::any::AnyRow;
use tracing::{debug, error};

const PROFILE_COLUMNS: &str = "id, email, phone, full_name, sms_opt_in, is_admin, created_at";

/// User profiles. Read-only apart from `create`, which only tests and local
/// development databases use; real profiles come from the sign-up flow.
#[derive(Debug, Clone)]
pub struct SqlProfileRepository {
    db_client: DbClient,
}

fn profile_from_row(row: &AnyRow) -> Result<Profile, DbError> {
    Ok(Profile {
        id: rows::string(row, "id")?,
        email: rows::string(row, "email")?,
        phone: rows::opt_string(row, "phone")?,
        full_name: rows::opt_string(row, "full_name")?,
        sms_opt_in: rows::boolean(row, "sms_opt_in")?,
        is_admin: rows::boolean(row, "is_admin")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

impl SqlProfileRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn create(&self, profile: Profile) -> Result<Profile, DbError> {
        self.db_client.require(Capability::Elevated, "create_profile")?;

        let query = r#"
            INSERT INTO profiles (id, email, phone, full_name, sms_opt_in, is_admin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;
        sqlx::query(query)
            .bind(&profile.id)
            .bind(&profile.email)
            .bind(profile.phone.clone())
            .bind(profile.full_name.clone())
            .bind(rows::flag(profile.sms_opt_in))
            .bind(rows::flag(profile.is_admin))
            .bind(rows::ts(profile.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert profile: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(profile)
    }

    /// Emails compare case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, DbError> {
        self.db_client.require(Capability::Elevated, "find_profile")?;
        debug!("Finding profile by email {}", email);

        let query = format!(
            "SELECT {} FROM profiles WHERE LOWER(email) = LOWER($1)",
            PROFILE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(email.trim())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find profile: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Profile>, DbError> {
        self.db_client.require(Capability::Elevated, "find_profile")?;

        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find profile: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(profile_from_row).transpose()
    }
}
