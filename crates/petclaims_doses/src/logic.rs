//! Token issuance, validation and the exactly-once confirmation.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use petclaims_common::models::{local_day, parse_time_zone, Dose, DoseStatus, Medication};
use petclaims_config::DoseConfig;
use petclaims_db::rows::new_id;
use petclaims_db::DoseRepository;
use rand::rngs::OsRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DoseError;

/// Short-code characters. No `0`/`O`, `1`/`I` or other look-alikes.
pub const SHORT_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const DEFAULT_SHORT_CODE_LENGTH: usize = 6;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Token settings resolved from [`DoseConfig`].
#[derive(Debug, Clone)]
pub struct DoseSettings {
    pub token_ttl: Duration,
    pub short_code_length: usize,
    pub public_base_url: String,
    pub time_zone: Tz,
}

impl DoseSettings {
    pub fn from_config(config: &DoseConfig) -> Result<Self, DoseError> {
        if config.token_ttl_hours <= 0 {
            return Err(DoseError::ConfigError(format!(
                "token_ttl_hours must be positive, got {}",
                config.token_ttl_hours
            )));
        }
        let time_zone =
            parse_time_zone(&config.time_zone).map_err(|e| DoseError::ConfigError(e.to_string()))?;

        let token_ttl = Duration::try_hours(config.token_ttl_hours).ok_or_else(|| {
            DoseError::ConfigError(format!(
                "token_ttl_hours out of range: {}",
                config.token_ttl_hours
            ))
        })?;

        Ok(Self {
            token_ttl,
            short_code_length: if config.short_code_length == 0 {
                DEFAULT_SHORT_CODE_LENGTH
            } else {
                config.short_code_length
            },
            public_base_url: config.public_base_url.clone(),
            time_zone,
        })
    }
}

impl Default for DoseSettings {
    fn default() -> Self {
        Self {
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            short_code_length: DEFAULT_SHORT_CODE_LENGTH,
            public_base_url: DoseConfig::default().public_base_url,
            time_zone: chrono_tz::America::Chicago,
        }
    }
}

/// A freshly minted token, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub short_code: String,
    pub expires_at: DateTime<Utc>,
}

/// `length` characters from [`SHORT_CODE_ALPHABET`], drawn from the OS RNG.
pub fn generate_short_code(length: usize) -> String {
    (0..length)
        .map(|_| {
            let idx = OsRng.gen_range(0..SHORT_CODE_ALPHABET.len());
            char::from(SHORT_CODE_ALPHABET[idx])
        })
        .collect()
}

pub fn issue_token(
    now: DateTime<Utc>,
    ttl: Duration,
    short_code_length: usize,
) -> Result<IssuedToken, DoseError> {
    let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
        DoseError::ConfigError(format!("token lifetime {} overflows from {}", ttl, now))
    })?;
    Ok(IssuedToken {
        token: Uuid::new_v4().to_string(),
        short_code: generate_short_code(short_code_length),
        expires_at,
    })
}

/// Result of looking a token up on the public read path.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenLookup {
    Valid(Dose),
    /// Still pending, but the token ran out.
    Expired(Dose),
    /// Unknown token, or one already used. The two are indistinguishable.
    NotFound,
}

impl TokenLookup {
    /// Stable label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            TokenLookup::Valid(_) => "valid",
            TokenLookup::Expired(_) => "expired",
            TokenLookup::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// This call moved the dose to `confirmed`.
    Confirmed(Dose),
    /// Unknown, already used or expired.
    LinkInvalid,
}

/// Tokens are v4 UUIDs; anything else cannot match a row.
fn is_well_formed(token: &str) -> bool {
    Uuid::parse_str(token).is_ok()
}

pub async fn validate_token<R: DoseRepository>(
    repo: &R,
    token: &str,
    now: DateTime<Utc>,
) -> Result<TokenLookup, DoseError> {
    if !is_well_formed(token) {
        debug!("Rejecting malformed token");
        return Ok(TokenLookup::NotFound);
    }

    let lookup = match repo.find_pending_by_token(token).await? {
        None => TokenLookup::NotFound,
        Some(dose) if dose.is_token_expired(now) => TokenLookup::Expired(dose),
        Some(dose) => TokenLookup::Valid(dose),
    };
    debug!(result = lookup.label(), "Token lookup");
    Ok(lookup)
}

/// Confirm the dose behind `token` with one conditional update. Of any
/// number of concurrent calls for the same token at most one sees
/// [`ConfirmOutcome::Confirmed`].
pub async fn confirm_dose<R: DoseRepository>(
    repo: &R,
    token: &str,
    now: DateTime<Utc>,
) -> Result<ConfirmOutcome, DoseError> {
    if !is_well_formed(token) || !repo.confirm_by_token(token, now).await? {
        debug!("Confirmation refused");
        return Ok(ConfirmOutcome::LinkInvalid);
    }

    let dose = repo
        .find_by_token(token)
        .await?
        .ok_or_else(|| DoseError::DoseNotFound(token.to_string()))?;
    info!(dose_id = %dose.id, "Dose confirmed");
    Ok(ConfirmOutcome::Confirmed(dose))
}

/// Issue a token for one occurrence of `medication` and store it as pending.
pub async fn create_dose<R: DoseRepository>(
    repo: &R,
    medication: &Medication,
    scheduled_time: DateTime<Utc>,
    now: DateTime<Utc>,
    settings: &DoseSettings,
) -> Result<Dose, DoseError> {
    let issued = issue_token(now, settings.token_ttl, settings.short_code_length)?;
    let dose = Dose {
        id: new_id(),
        medication_id: medication.id.clone(),
        user_id: medication.user_id.clone(),
        scheduled_time,
        status: DoseStatus::Pending,
        one_time_token: issued.token,
        token_expires_at: issued.expires_at,
        short_code: issued.short_code,
        confirmed_at: None,
        created_at: now,
    };

    Ok(repo.create(dose).await?)
}

/// `<base>/confirm-dose/<token>`
pub fn confirmation_link(base_url: &str, token: &str) -> String {
    format!("{}/confirm-dose/{}", base_url.trim_end_matches('/'), token)
}

/// Body of the reminder text.
pub fn reminder_message(
    medication: &Medication,
    pet_name: Option<&str>,
    link: &str,
    short_code: &str,
) -> String {
    let what = match medication.dosage.as_deref().filter(|d| !d.is_empty()) {
        Some(dosage) => format!("{} ({})", medication.name, dosage),
        None => medication.name.clone(),
    };
    let whom = pet_name
        .filter(|n| !n.is_empty())
        .map(|n| format!(" for {}", n))
        .unwrap_or_default();

    format!(
        "PetClaims reminder: time to give {}{}. Tap to confirm: {} (code {})",
        what, whom, link, short_code
    )
}

/// Medications active on the local calendar day of `now` in `tz`.
pub fn active_medications(medications: &[Medication], now: DateTime<Utc>, tz: Tz) -> Vec<Medication> {
    active_on(medications, local_day(now, tz))
}

pub fn active_on(medications: &[Medication], day: NaiveDate) -> Vec<Medication> {
    medications
        .iter()
        .filter(|m| m.is_active_on(day))
        .cloned()
        .collect()
}

/// Public shape of a dose: no user id, no token.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PublicDose {
    pub id: String,
    pub medication_id: String,
    pub scheduled_time: DateTime<Utc>,
    pub short_code: String,
    pub status: DoseStatus,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<&Dose> for PublicDose {
    fn from(dose: &Dose) -> Self {
        Self {
            id: dose.id.clone(),
            medication_id: dose.medication_id.clone(),
            scheduled_time: dose.scheduled_time,
            short_code: dose.short_code.clone(),
            status: dose.status,
            expires_at: dose.token_expires_at,
            confirmed_at: dose.confirmed_at,
        }
    }
}
