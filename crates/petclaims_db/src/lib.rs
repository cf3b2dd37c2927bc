//! Storage layer for the pet-claims back office
//!
//! A database-agnostic client over SQLx's `Any` driver. SQLite is the default
//! backend (local development and tests); the hosted Postgres database is
//! enabled with the `postgres` feature:
//!
//! ```toml
//! [dependencies]
//! petclaims-db = { path = "../petclaims_db", features = ["postgres"] }
//! ```
//!
//! Every [`DbClient`] carries a [`Capability`]. Repositories check it before
//! doing anything the public tier may not do.
//!
//! ```rust,no_run
//! use petclaims_db::{Capability, DbClient, DoseRepository, SqlDoseRepository};
//!
//! async fn lookup(token: &str) -> Result<(), petclaims_db::DbError> {
//!     let client = DbClient::from_url("sqlite::memory:", Capability::Restricted).await?;
//!     let doses = SqlDoseRepository::new(client);
//!     let _dose = doses.find_pending_by_token(token).await?;
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod client;
pub mod error;
pub mod repositories;
pub mod rows;
pub mod schema;

pub use capability::Capability;
pub use client::DbClient;
pub use error::DbError;
pub use repositories::{
    Dose, DoseRepository, DoseStatus, FieldCount, FieldRepair, SqlClaimRepository,
    SqlDoseRepository, SqlMedicationRepository, SqlPetRepository, SqlProfileRepository,
    SqlReminderLogRepository, OPTIONAL_PET_COLUMNS,
};
pub use schema::{check_schema, init_schema, SchemaReport, TABLES};
