use anyhow::{anyhow, Result};
use petclaims_common::models::{local_day, Profile};
use petclaims_db::{
    Capability, DbClient, DoseRepository, SqlClaimRepository, SqlDoseRepository,
    SqlMedicationRepository, SqlPetRepository, SqlProfileRepository, SqlReminderLogRepository,
};
use petclaims_doses::active_on;
use serde::Serialize;
use tracing::info;

use crate::context::AdminContext;
use crate::operation::{AdminOperation, AdminOutput, OperationFuture, OperationInput};

async fn profile_by_email(db: &DbClient, email: &str) -> Result<Profile> {
    SqlProfileRepository::new(db.clone())
        .find_by_email(email)
        .await?
        .ok_or_else(|| anyhow!("No profile with email {}", email))
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Profile, pets, medications and open doses for one account.
pub struct InspectUser;

impl AdminOperation for InspectUser {
    fn name(&self) -> &'static str {
        "inspect-user"
    }

    fn description(&self) -> &'static str {
        "Show a user's profile, pets, medications and pending doses"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let db = ctx.db()?;
            let profile = profile_by_email(db, input.email()?).await?;
            let pets = SqlPetRepository::new(db.clone()).find_by_user(&profile.id).await?;
            let medications = SqlMedicationRepository::new(db.clone())
                .find_by_user(&profile.id)
                .await?;
            let pending = SqlDoseRepository::new(db.clone())
                .list_pending_for_user(&profile.id)
                .await?;
            let today = local_day(ctx.now(), ctx.settings().time_zone);

            let mut output = AdminOutput::new(format!(
                "{} ({}): {} pet(s), {} medication(s), {} pending dose(s)",
                profile.email,
                profile.id,
                pets.len(),
                medications.len(),
                pending.len()
            ))
            .line(format!(
                "phone {}  sms opt-in {}  admin {}",
                or_dash(profile.phone.as_deref()),
                profile.sms_opt_in,
                profile.is_admin
            ));

            for pet in &pets {
                output = output.line(format!(
                    "pet {}  {}  {}  insurer {}  policy {}",
                    pet.id,
                    pet.name,
                    or_dash(pet.species.as_deref()),
                    or_dash(pet.insurance_company.as_deref()),
                    or_dash(pet.policy_number.as_deref())
                ));
            }
            for med in &medications {
                output = output.line(format!(
                    "medication {}  {}  {} .. {}  times {:?}{}",
                    med.id,
                    med.name,
                    med.start_date,
                    med.end_date.map(|d| d.to_string()).unwrap_or_else(|| "open".into()),
                    med.reminder_times,
                    if med.is_active_on(today) { "  (active today)" } else { "" }
                ));
            }
            for dose in &pending {
                output = output.line(format!(
                    "dose {}  scheduled {}  code {}  expires {}",
                    dose.id, dose.scheduled_time, dose.short_code, dose.token_expires_at
                ));
            }

            output.with_data(&serde_json::json!({
                "profile": &profile,
                "pets": &pets,
                "medications": &medications,
                "pendingDoses": &pending,
            }))
        })
    }
}

/// Medications whose date range covers a given local day.
pub struct ActiveMedications;

impl AdminOperation for ActiveMedications {
    fn name(&self) -> &'static str {
        "active-medications"
    }

    fn description(&self) -> &'static str {
        "List a user's medications active on a date (default: today)"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let db = ctx.db()?;
            let profile = profile_by_email(db, input.email()?).await?;
            let medications = SqlMedicationRepository::new(db.clone())
                .find_by_user(&profile.id)
                .await?;

            let day = input
                .date
                .unwrap_or_else(|| local_day(ctx.now(), ctx.settings().time_zone));
            let active = active_on(&medications, day);

            AdminOutput::new(format!(
                "{} of {} medication(s) active on {} ({})",
                active.len(),
                medications.len(),
                day,
                ctx.settings().time_zone
            ))
            .lines(active.iter().map(|m| {
                format!(
                    "{}  {}  {}",
                    m.id,
                    m.name,
                    or_dash(m.dosage.as_deref())
                )
            }))
            .with_data(&serde_json::json!({
                "date": day,
                "timeZone": ctx.settings().time_zone.name(),
                "medications": &active,
            }))
        })
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Deleted {
    reminder_log: u64,
    doses: u64,
    medications: u64,
    claims: u64,
    pets: u64,
}

/// Remove everything hanging off a test account. The profile itself stays
/// because it belongs to the auth provider.
pub struct DeleteTestData;

impl AdminOperation for DeleteTestData {
    fn name(&self) -> &'static str {
        "delete-test-data"
    }

    fn description(&self) -> &'static str {
        "Delete a user's doses, medications, claims and pets (keeps the profile)"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let db = ctx.db()?;
            let profile = profile_by_email(db, input.email()?).await?;
            let user_id = profile.id.as_str();

            // Children first.
            let deleted = Deleted {
                reminder_log: SqlReminderLogRepository::new(db.clone())
                    .delete_for_user(user_id)
                    .await?,
                doses: SqlDoseRepository::new(db.clone())
                    .delete_for_user(user_id)
                    .await?,
                medications: SqlMedicationRepository::new(db.clone())
                    .delete_for_user(user_id)
                    .await?,
                claims: SqlClaimRepository::new(db.clone())
                    .delete_for_user(user_id)
                    .await?,
                pets: SqlPetRepository::new(db.clone())
                    .delete_for_user(user_id)
                    .await?,
            };
            info!(user_id, ?deleted, "Test data deleted");

            AdminOutput::new(format!("Deleted test data for {}", profile.email))
                .line(format!("reminder log  {}", deleted.reminder_log))
                .line(format!("doses         {}", deleted.doses))
                .line(format!("medications   {}", deleted.medications))
                .line(format!("claims        {}", deleted.claims))
                .line(format!("pets          {}", deleted.pets))
                .with_data(&deleted)
        })
    }
}
