use anyhow::{anyhow, bail};
use chrono::Duration;
use petclaims_db::{Capability, DoseRepository, SqlDoseRepository, SqlMedicationRepository};
use petclaims_doses::{
    confirm_dose, confirmation_link, create_dose, validate_token, ConfirmOutcome, PublicDose,
    TokenLookup,
};
use serde::Serialize;

use crate::context::AdminContext;
use crate::operation::{AdminOperation, AdminOutput, OperationFuture, OperationInput};

/// Issue a token for a medication and store a pending dose, standing in for
/// the reminder scheduler.
pub struct CreateTestDose;

impl AdminOperation for CreateTestDose {
    fn name(&self) -> &'static str {
        "create-test-dose"
    }

    fn description(&self) -> &'static str {
        "Create a pending dose and print its confirmation link and code"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let db = ctx.db()?;
            let medication_id = input.medication_id()?;
            let medication = SqlMedicationRepository::new(db.clone())
                .find_by_id(medication_id)
                .await?
                .ok_or_else(|| anyhow!("No medication with id {}", medication_id))?;

            let now = ctx.now();
            let offset = input.in_minutes.unwrap_or(0);
            let Some(scheduled) = Duration::try_minutes(offset)
                .and_then(|delta| now.checked_add_signed(delta))
            else {
                bail!("--in-minutes {} is out of range", offset);
            };
            let dose = create_dose(
                &SqlDoseRepository::new(db.clone()),
                &medication,
                scheduled,
                now,
                ctx.settings(),
            )
            .await?;
            let link = confirmation_link(&ctx.settings().public_base_url, &dose.one_time_token);

            AdminOutput::new(format!("Created dose {} for {}", dose.id, medication.name))
                .line(format!("link        {}", link))
                .line(format!("short code  {}", dose.short_code))
                .line(format!("token       {}", dose.one_time_token))
                .line(format!("scheduled   {}", dose.scheduled_time))
                .line(format!("expires     {}", dose.token_expires_at))
                .with_data(&serde_json::json!({
                    "dose": &dose,
                    "link": link,
                }))
        })
    }
}

#[derive(Serialize)]
struct TokenReport {
    result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dose: Option<PublicDose>,
}

/// Operator view of a token. Unlike the public route this tells expired and
/// unknown tokens apart.
pub struct CheckToken;

impl AdminOperation for CheckToken {
    fn name(&self) -> &'static str {
        "check-token"
    }

    fn description(&self) -> &'static str {
        "Report whether a token is valid, expired or not found"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Restricted)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let repo = SqlDoseRepository::new(ctx.db()?.clone());
            let lookup = validate_token(&repo, input.token()?, ctx.now()).await?;

            let (summary, dose) = match &lookup {
                TokenLookup::Valid(dose) => (
                    format!("valid: dose {} expires {}", dose.id, dose.token_expires_at),
                    Some(PublicDose::from(dose)),
                ),
                TokenLookup::Expired(dose) => (
                    format!("expired: dose {} expired {}", dose.id, dose.token_expires_at),
                    Some(PublicDose::from(dose)),
                ),
                TokenLookup::NotFound => (
                    "not found: no pending dose has this token".to_string(),
                    None,
                ),
            };

            AdminOutput::new(summary).with_data(&TokenReport {
                result: lookup.label(),
                dose,
            })
        })
    }
}

/// Run the same conditional confirmation as the public link.
pub struct ConfirmToken;

impl AdminOperation for ConfirmToken {
    fn name(&self) -> &'static str {
        "confirm-token"
    }

    fn description(&self) -> &'static str {
        "Confirm the dose behind a token, exactly as the link would"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Restricted)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let repo = SqlDoseRepository::new(ctx.db()?.clone());
            match confirm_dose(&repo, input.token()?, ctx.now()).await? {
                ConfirmOutcome::Confirmed(dose) => {
                    AdminOutput::new(format!("confirmed: dose {}", dose.id)).with_data(
                        &TokenReport {
                            result: "confirmed",
                            dose: Some(PublicDose::from(&dose)),
                        },
                    )
                }
                ConfirmOutcome::LinkInvalid => AdminOutput::new(
                    "link invalid: unknown, already used or expired",
                )
                .with_data(&TokenReport {
                    result: "invalid",
                    dose: None,
                }),
            }
        })
    }
}

pub struct ExpireStaleDoses;

impl AdminOperation for ExpireStaleDoses {
    fn name(&self) -> &'static str {
        "expire-stale-doses"
    }

    fn description(&self) -> &'static str {
        "Mark pending doses whose token has run out as expired"
    }

    fn requires(&self) -> Option<Capability> {
        Some(Capability::Elevated)
    }

    fn run<'a>(&'a self, ctx: &'a AdminContext, _input: &'a OperationInput) -> OperationFuture<'a> {
        Box::pin(async move {
            let expired = SqlDoseRepository::new(ctx.db()?.clone())
                .expire_stale(ctx.now())
                .await?;
            AdminOutput::new(format!("Expired {} stale dose(s)", expired))
                .with_data(&serde_json::json!({ "expired": expired }))
        })
    }
}
