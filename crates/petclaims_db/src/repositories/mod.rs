//! Repository modules for database access

pub mod claim;
pub mod dose;
pub mod dose_sql;
pub mod medication;
pub mod pet;
pub mod profile;
pub mod reminder_log;

pub use claim::SqlClaimRepository;
pub use dose::{Dose, DoseRepository, DoseStatus};
pub use dose_sql::SqlDoseRepository;
pub use medication::SqlMedicationRepository;
pub use pet::{FieldCount, FieldRepair, SqlPetRepository, OPTIONAL_PET_COLUMNS};
pub use profile::SqlProfileRepository;
pub use reminder_log::SqlReminderLogRepository;
