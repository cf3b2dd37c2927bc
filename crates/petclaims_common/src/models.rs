// --- File: crates/petclaims_common/src/models.rs ---

// Records shared by the storage layer, the dose-token flow and the admin CLI.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{config_error, validation_error, PetClaimsError};

/// Lifecycle of a dose: `pending` until the user follows the confirmation
/// link, `expired` once an operator sweeps stale tokens.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Pending,
    Confirmed,
    Expired,
}

impl DoseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoseStatus::Pending => "pending",
            DoseStatus::Confirmed => "confirmed",
            DoseStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseStatus {
    type Err = PetClaimsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DoseStatus::Pending),
            "confirmed" => Ok(DoseStatus::Confirmed),
            "expired" => Ok(DoseStatus::Expired),
            other => Err(validation_error(format!("unknown dose status '{}'", other))),
        }
    }
}

/// One scheduled medication reminder occurrence with its confirmation token.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dose {
    pub id: String,
    pub medication_id: String,
    pub user_id: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: DoseStatus,
    pub one_time_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub short_code: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Dose {
    /// Whether the token has passed its expiry at `now`.
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.token_expires_at
    }
}

/// A medication schedule for one pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub user_id: String,
    pub pet_id: String,
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    /// Time-of-day values, `HH:MM`.
    pub reminder_times: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    /// Both bounds are inclusive; a missing end date means open-ended.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        let started = day >= self.start_date;
        let not_ended = self.end_date.map(|end| day <= end).unwrap_or(true);
        started && not_ended
    }

    /// Evaluates [`Medication::is_active_on`] for the calendar day that `now`
    /// falls on in `tz`, i.e. `now` truncated to local midnight.
    pub fn is_active_today(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        self.is_active_on(local_day(now, tz))
    }
}

/// The local calendar day of `now` in `tz`.
pub fn local_day(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Parse an IANA zone name such as `America/Chicago`.
pub fn parse_time_zone(name: &str) -> Result<Tz, PetClaimsError> {
    name.parse::<Tz>()
        .map_err(|e| config_error(format!("invalid time zone '{}': {}", name, e)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub species: Option<String>,
    pub insurance_company: Option<String>,
    pub policy_number: Option<String>,
    pub healthy_paws_pet_id: Option<String>,
    pub pumpkin_account_number: Option<String>,
    pub spot_account_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub adoption_date: Option<NaiveDate>,
    pub spay_neuter_status: Option<String>,
}

/// A single insurance-claim submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub user_id: String,
    pub pet_id: String,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub visit_date: Option<NaiveDate>,
    pub total_amount: Option<f64>,
    pub line_items: serde_json::Value,
    pub filing_status: String,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The user account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub sms_opt_in: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// One reminder delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderLogEntry {
    pub id: String,
    pub dose_id: String,
    pub user_id: String,
    pub channel: String,
    pub sent_at: DateTime<Utc>,
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn medication(start: NaiveDate, end: Option<NaiveDate>) -> Medication {
        Medication {
            id: "med-1".into(),
            user_id: "user-1".into(),
            pet_id: "pet-1".into(),
            name: "Apoquel".into(),
            dosage: Some("16mg".into()),
            frequency: Some("daily".into()),
            reminder_times: vec!["08:00".into()],
            start_date: start,
            end_date: end,
            created_at: Utc::now(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_medication_is_active_that_day() {
        let today = day(2025, 3, 14);
        let med = medication(today, Some(today));
        assert!(med.is_active_on(today));
        assert!(!med.is_active_on(day(2025, 3, 13)));
        assert!(!med.is_active_on(day(2025, 3, 15)));
    }

    #[test]
    fn test_single_day_medication_late_evening_local_time() {
        // 23:30 in Chicago is already the next day in UTC.
        let tz: Tz = "America/Chicago".parse().unwrap();
        let now = tz
            .with_ymd_and_hms(2025, 3, 14, 23, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        let med = medication(day(2025, 3, 14), Some(day(2025, 3, 14)));
        assert!(med.is_active_today(now, tz));
        assert_eq!(now.date_naive(), day(2025, 3, 15));
    }

    #[test]
    fn test_open_ended_medication() {
        let med = medication(day(2025, 1, 1), None);
        assert!(med.is_active_on(day(2030, 1, 1)));
        assert!(!med.is_active_on(day(2024, 12, 31)));
    }

    #[test]
    fn test_dose_status_round_trips_through_text() {
        for status in [DoseStatus::Pending, DoseStatus::Confirmed, DoseStatus::Expired] {
            assert_eq!(status.as_str().parse::<DoseStatus>().unwrap(), status);
        }
        assert!("used".parse::<DoseStatus>().is_err());
    }

    #[test]
    fn test_parse_time_zone_rejects_garbage() {
        assert!(parse_time_zone("America/Chicago").is_ok());
        assert!(parse_time_zone("Mars/Olympus").is_err());
    }
}
