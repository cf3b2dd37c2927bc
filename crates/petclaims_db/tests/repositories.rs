use chrono::{Duration, NaiveDate, SubsecRound, TimeZone, Utc};
use petclaims_common::models::{Claim, Medication, Pet, Profile, ReminderLogEntry};
use petclaims_db::{
    init_schema, Capability, DbClient, DbError, Dose, DoseRepository, DoseStatus,
    SqlClaimRepository, SqlDoseRepository, SqlMedicationRepository, SqlPetRepository,
    SqlProfileRepository, SqlReminderLogRepository,
};

async fn elevated_client() -> DbClient {
    let client = DbClient::from_url("sqlite::memory:", Capability::Elevated)
        .await
        .unwrap();
    init_schema(&client).await.unwrap();
    client
}

fn pending_dose(token: &str, expires_in: Duration) -> Dose {
    // Stored timestamps keep microseconds.
    let now = Utc::now().trunc_subsecs(6);
    Dose {
        id: uuid::Uuid::new_v4().to_string(),
        medication_id: "med-1".to_string(),
        user_id: "user-1".to_string(),
        scheduled_time: now,
        status: DoseStatus::Pending,
        one_time_token: token.to_string(),
        token_expires_at: now + expires_in,
        short_code: "ABC234".to_string(),
        confirmed_at: None,
        created_at: now,
    }
}

fn pet(id: &str, user_id: &str) -> Pet {
    Pet {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: "Biscuit".to_string(),
        species: Some("dog".to_string()),
        insurance_company: Some("Pumpkin".to_string()),
        policy_number: None,
        healthy_paws_pet_id: None,
        pumpkin_account_number: Some("PK-1".to_string()),
        spot_account_number: None,
        date_of_birth: NaiveDate::from_ymd_opt(2020, 5, 1),
        adoption_date: None,
        spay_neuter_status: None,
    }
}

#[tokio::test]
async fn test_dose_round_trip_and_pending_lookup() {
    let client = elevated_client().await;
    let doses = SqlDoseRepository::new(client.clone());
    let dose = pending_dose("tok-1", Duration::hours(24));
    doses.create(dose.clone()).await.unwrap();

    let found = doses.find_pending_by_token("tok-1").await.unwrap().unwrap();
    assert_eq!(found.id, dose.id);
    assert_eq!(found.status, DoseStatus::Pending);
    assert_eq!(found.token_expires_at, dose.token_expires_at);
    assert!(doses.find_pending_by_token("nope").await.unwrap().is_none());

    let listed = doses.list_pending_for_user("user-1").await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_conditional_confirm_succeeds_once() {
    let client = elevated_client().await;
    let doses = SqlDoseRepository::new(client.clone());
    doses
        .create(pending_dose("tok-once", Duration::hours(1)))
        .await
        .unwrap();

    let public = SqlDoseRepository::new(client.with_capability(Capability::Restricted));
    let now = Utc::now();
    assert!(public.confirm_by_token("tok-once", now).await.unwrap());
    assert!(!public.confirm_by_token("tok-once", now).await.unwrap());

    let stored = public.find_by_token("tok-once").await.unwrap().unwrap();
    assert_eq!(stored.status, DoseStatus::Confirmed);
    assert!(stored.confirmed_at.is_some());
    assert!(public.find_pending_by_token("tok-once").await.unwrap().is_none());
}

#[tokio::test]
async fn test_confirm_refuses_expired_token() {
    let client = elevated_client().await;
    let doses = SqlDoseRepository::new(client);
    doses
        .create(pending_dose("tok-old", Duration::minutes(-5)))
        .await
        .unwrap();

    assert!(!doses.confirm_by_token("tok-old", Utc::now()).await.unwrap());
    assert_eq!(doses.expire_stale(Utc::now()).await.unwrap(), 1);
    let stored = doses.find_by_token("tok-old").await.unwrap().unwrap();
    assert_eq!(stored.status, DoseStatus::Expired);
}

#[tokio::test]
async fn test_restricted_tier_cannot_list_or_create() {
    let client = elevated_client().await;
    let public = SqlDoseRepository::new(client.with_capability(Capability::Restricted));

    assert!(matches!(
        public.list_pending_for_user("user-1").await,
        Err(DbError::PermissionDenied(_))
    ));
    assert!(matches!(
        public.create(pending_dose("tok-x", Duration::hours(1))).await,
        Err(DbError::PermissionDenied(_))
    ));
    assert!(matches!(
        public.delete_for_user("user-1").await,
        Err(DbError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn test_medication_round_trip() {
    let client = elevated_client().await;
    let medications = SqlMedicationRepository::new(client);
    let med = Medication {
        id: "med-1".to_string(),
        user_id: "user-1".to_string(),
        pet_id: "pet-1".to_string(),
        name: "Apoquel".to_string(),
        dosage: Some("16mg".to_string()),
        frequency: Some("twice daily".to_string()),
        reminder_times: vec!["08:00".to_string(), "20:00".to_string()],
        start_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 14),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    };
    medications.create(med.clone()).await.unwrap();

    assert_eq!(medications.find_by_id("med-1").await.unwrap(), Some(med.clone()));
    assert_eq!(medications.find_by_user("user-1").await.unwrap(), vec![med]);
}

#[tokio::test]
async fn test_profile_lookup_ignores_email_case() {
    let client = elevated_client().await;
    let profiles = SqlProfileRepository::new(client);
    profiles
        .create(Profile {
            id: "user-1".to_string(),
            email: "Owner@Example.com".to_string(),
            phone: Some("+13123050403".to_string()),
            full_name: Some("Pat Owner".to_string()),
            sms_opt_in: true,
            is_admin: false,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let found = profiles
        .find_by_email("owner@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, "user-1");
    assert!(found.sms_opt_in);
    assert!(!found.is_admin);
}

#[tokio::test]
async fn test_find_and_repair_empty_strings() {
    let client = elevated_client().await;
    let pets = SqlPetRepository::new(client.clone());
    pets.create(pet("pet-1", "user-1")).await.unwrap();
    pets.create(pet("pet-2", "user-1")).await.unwrap();
    client
        .execute("UPDATE pets SET policy_number = '' WHERE id = 'pet-1'")
        .await
        .unwrap();

    let counts = pets.field_counts().await.unwrap();
    let policy = counts.iter().find(|c| c.column == "policy_number").unwrap();
    assert_eq!((policy.null_count, policy.empty_count), (1, 1));

    let planned = pets.repair_empty_strings(true).await.unwrap();
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].rows, 1);
    let still_empty = pets.field_counts().await.unwrap();
    assert!(still_empty.iter().any(|c| c.empty_count == 1));

    let repaired = pets.repair_empty_strings(false).await.unwrap();
    assert_eq!(repaired, planned);
    let after = pets.field_counts().await.unwrap();
    assert!(after.iter().all(|c| c.empty_count == 0));
    let policy = after.iter().find(|c| c.column == "policy_number").unwrap();
    assert_eq!(policy.null_count, 2);
}

#[tokio::test]
async fn test_claims_and_reminder_log() {
    let client = elevated_client().await;
    let claims = SqlClaimRepository::new(client.clone());
    let claim = Claim {
        id: "claim-1".to_string(),
        user_id: "user-1".to_string(),
        pet_id: "pet-1".to_string(),
        clinic_name: Some("Lakeview Animal Hospital".to_string()),
        clinic_address: None,
        visit_date: NaiveDate::from_ymd_opt(2025, 2, 3),
        total_amount: Some(182.5),
        line_items: serde_json::json!([{"description": "Exam", "amount": 65.0}]),
        filing_status: "draft".to_string(),
        document_url: None,
        created_at: Utc.with_ymd_and_hms(2025, 2, 3, 18, 0, 0).unwrap(),
    };
    claims.create(claim.clone()).await.unwrap();
    assert_eq!(claims.find_by_user("user-1").await.unwrap(), vec![claim]);

    let log = SqlReminderLogRepository::new(client);
    log.record(ReminderLogEntry {
        id: "log-1".to_string(),
        dose_id: "dose-1".to_string(),
        user_id: "user-1".to_string(),
        channel: "sms".to_string(),
        sent_at: Utc::now(),
        success: false,
        message_id: None,
        error: Some("Invalid parameter: PhoneNumber".to_string()),
    })
    .await
    .unwrap();
    let entries = log.find_by_dose("dose-1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].success);

    assert_eq!(claims.delete_for_user("user-1").await.unwrap(), 1);
    assert_eq!(log.delete_for_user("user-1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_records_with_every_optional_column_null() {
    let client = elevated_client().await;

    let pets = SqlPetRepository::new(client.clone());
    let bare_pet = Pet {
        id: "pet-bare".to_string(),
        user_id: "user-2".to_string(),
        name: "Pickle".to_string(),
        species: None,
        insurance_company: None,
        policy_number: None,
        healthy_paws_pet_id: None,
        pumpkin_account_number: None,
        spot_account_number: None,
        date_of_birth: None,
        adoption_date: None,
        spay_neuter_status: None,
    };
    pets.create(bare_pet.clone()).await.unwrap();
    assert_eq!(pets.find_by_user("user-2").await.unwrap(), vec![bare_pet]);

    let medications = SqlMedicationRepository::new(client.clone());
    let bare_med = Medication {
        id: "med-bare".to_string(),
        user_id: "user-2".to_string(),
        pet_id: "pet-bare".to_string(),
        name: "Gabapentin".to_string(),
        dosage: None,
        frequency: None,
        reminder_times: vec![],
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        end_date: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
    };
    medications.create(bare_med.clone()).await.unwrap();
    assert_eq!(medications.find_by_id("med-bare").await.unwrap(), Some(bare_med));

    let claims = SqlClaimRepository::new(client.clone());
    let bare_claim = Claim {
        id: "claim-bare".to_string(),
        user_id: "user-2".to_string(),
        pet_id: "pet-bare".to_string(),
        clinic_name: None,
        clinic_address: None,
        visit_date: None,
        total_amount: None,
        line_items: serde_json::json!([]),
        filing_status: "draft".to_string(),
        document_url: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
    };
    claims.create(bare_claim.clone()).await.unwrap();
    assert_eq!(claims.find_by_user("user-2").await.unwrap(), vec![bare_claim]);

    let profiles = SqlProfileRepository::new(client);
    profiles
        .create(Profile {
            id: "user-2".to_string(),
            email: "bare@example.com".to_string(),
            phone: None,
            full_name: None,
            sms_opt_in: false,
            is_admin: false,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
        })
        .await
        .unwrap();
    let found = profiles.find_by_id("user-2").await.unwrap().unwrap();
    assert!(found.phone.is_none());
    assert!(found.full_name.is_none());
}
