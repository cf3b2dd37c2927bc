//! Composing and sending the reminder text for one dose.
//!
//! The scheduler that decides *when* to call this lives outside the back
//! office; operators can trigger a single reminder from the admin CLI.

use chrono::{DateTime, Utc};
use petclaims_common::models::{DoseStatus, ReminderLogEntry};
use petclaims_common::services::{SmsResult, SmsService};
use petclaims_db::rows::new_id;
use petclaims_db::{
    DbClient, DoseRepository, SqlDoseRepository, SqlMedicationRepository, SqlPetRepository,
    SqlProfileRepository, SqlReminderLogRepository,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::DoseError;
use crate::logic::{confirmation_link, reminder_message, DoseSettings};

pub const SMS_CHANNEL: &str = "sms";

/// What happened to one reminder.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReminderReport {
    pub dose_id: String,
    pub message: String,
    /// Why nothing was sent, when nothing was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SmsResult>,
}

impl ReminderReport {
    pub fn sent(&self) -> bool {
        self.result.as_ref().map(|r| r.success).unwrap_or(false)
    }
}

/// Send the reminder for `dose_id` if the dose is still open and the owner
/// opted in to texts. Every send attempt is written to the reminder log.
///
/// `sms` is only needed once the dose qualifies; a skipped reminder succeeds
/// without one.
pub async fn send_dose_reminder(
    db: &DbClient,
    sms: Option<&dyn SmsService>,
    settings: &DoseSettings,
    dose_id: &str,
    now: DateTime<Utc>,
) -> Result<ReminderReport, DoseError> {
    let dose = SqlDoseRepository::new(db.clone())
        .find_by_id(dose_id)
        .await?
        .ok_or_else(|| DoseError::DoseNotFound(dose_id.to_string()))?;
    let medication = SqlMedicationRepository::new(db.clone())
        .find_by_id(&dose.medication_id)
        .await?
        .ok_or_else(|| DoseError::MedicationNotFound(dose.medication_id.clone()))?;
    let profile = SqlProfileRepository::new(db.clone())
        .find_by_id(&dose.user_id)
        .await?
        .ok_or_else(|| DoseError::ProfileNotFound(dose.user_id.clone()))?;
    let pet_name = SqlPetRepository::new(db.clone())
        .find_by_user(&dose.user_id)
        .await?
        .into_iter()
        .find(|p| p.id == medication.pet_id)
        .map(|p| p.name);

    let link = confirmation_link(&settings.public_base_url, &dose.one_time_token);
    let message = reminder_message(&medication, pet_name.as_deref(), &link, &dose.short_code);

    let skip = |reason: &str| {
        info!(dose_id = %dose.id, "Reminder skipped: {}", reason);
        ReminderReport {
            dose_id: dose.id.clone(),
            message: message.clone(),
            skipped: Some(reason.to_string()),
            result: None,
        }
    };

    if dose.status != DoseStatus::Pending {
        return Ok(skip(&format!("dose is {}", dose.status)));
    }
    if dose.is_token_expired(now) {
        return Ok(skip("token has expired"));
    }
    if !profile.sms_opt_in {
        return Ok(skip("owner has not opted in to SMS"));
    }
    let Some(phone) = profile.phone.as_deref().filter(|p| !p.trim().is_empty()) else {
        return Ok(skip("owner has no phone number"));
    };
    let Some(sms) = sms else {
        return Err(DoseError::ConfigError("SMS is not configured".to_string()));
    };

    let result = sms.send_sms(phone, &message).await;
    if !result.success {
        warn!(dose_id = %dose.id, error = ?result.error, "Reminder SMS failed");
    }

    SqlReminderLogRepository::new(db.clone())
        .record(ReminderLogEntry {
            id: new_id(),
            dose_id: dose.id.clone(),
            user_id: dose.user_id.clone(),
            channel: SMS_CHANNEL.to_string(),
            sent_at: result.timestamp,
            success: result.success,
            message_id: result.message_id.clone(),
            error: result.error.clone(),
        })
        .await?;

    Ok(ReminderReport {
        dose_id: dose.id,
        message,
        skipped: None,
        result: Some(result),
    })
}
