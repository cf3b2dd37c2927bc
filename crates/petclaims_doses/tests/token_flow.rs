use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration, NaiveDate, SubsecRound, Utc};
use petclaims_common::models::{Medication, Pet, Profile};
use petclaims_common::services::{BoxOutcome, SmsResult, SmsService};
use petclaims_db::{
    init_schema, Capability, DbClient, DoseRepository, DoseStatus, SqlDoseRepository,
    SqlMedicationRepository, SqlPetRepository, SqlProfileRepository, SqlReminderLogRepository,
};
use petclaims_doses::{
    confirm_dose, create_dose, routes_with_repository, send_dose_reminder, validate_token,
    ConfirmOutcome, DoseSettings, TokenLookup, LINK_INVALID_MESSAGE,
};
use serde_json::Value;
use std::sync::Mutex;
use tower::ServiceExt;

async fn db() -> DbClient {
    let client = DbClient::from_url("sqlite::memory:", Capability::Elevated)
        .await
        .unwrap();
    init_schema(&client).await.unwrap();
    client
}

fn medication() -> Medication {
    Medication {
        id: "med-1".to_string(),
        user_id: "user-1".to_string(),
        pet_id: "pet-1".to_string(),
        name: "Apoquel".to_string(),
        dosage: Some("16mg".to_string()),
        frequency: Some("daily".to_string()),
        reminder_times: vec!["08:00".to_string()],
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        end_date: None,
        created_at: Utc::now().trunc_subsecs(6),
    }
}

fn settings(ttl: Duration) -> DoseSettings {
    DoseSettings {
        token_ttl: ttl,
        public_base_url: "https://app.petclaims.app".to_string(),
        ..DoseSettings::default()
    }
}

#[tokio::test]
async fn test_validate_pending_expired_and_missing() {
    let db = db().await;
    let doses = SqlDoseRepository::new(db.clone());
    let now = Utc::now();

    let live = create_dose(&doses, &medication(), now, now, &settings(Duration::hours(24)))
        .await
        .unwrap();
    let stale = create_dose(&doses, &medication(), now, now, &settings(Duration::minutes(1)))
        .await
        .unwrap();

    let public = SqlDoseRepository::new(db.with_capability(Capability::Restricted));
    match validate_token(&public, &live.one_time_token, now).await.unwrap() {
        TokenLookup::Valid(dose) => assert_eq!(dose.id, live.id),
        other => panic!("expected valid, got {:?}", other),
    }

    let later = now + Duration::minutes(5);
    assert!(matches!(
        validate_token(&public, &stale.one_time_token, later).await.unwrap(),
        TokenLookup::Expired(_)
    ));
    assert_eq!(
        validate_token(&public, &uuid::Uuid::new_v4().to_string(), now)
            .await
            .unwrap(),
        TokenLookup::NotFound
    );
    assert_eq!(
        validate_token(&public, "not-a-token", now).await.unwrap(),
        TokenLookup::NotFound
    );

    // An expired lookup leaves the row untouched.
    let row = doses.find_by_id(&stale.id).await.unwrap().unwrap();
    assert_eq!(row.status, DoseStatus::Pending);
}

#[tokio::test]
async fn test_token_confirms_exactly_once() {
    let db = db().await;
    let doses = SqlDoseRepository::new(db.clone());
    let now = Utc::now();
    let dose = create_dose(&doses, &medication(), now, now, &settings(Duration::hours(24)))
        .await
        .unwrap();

    let public = SqlDoseRepository::new(db.with_capability(Capability::Restricted));
    let token = dose.one_time_token.clone();
    let (a, b) = tokio::join!(
        confirm_dose(&public, &token, now),
        confirm_dose(&public, &token, now)
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let confirmed = outcomes
        .iter()
        .filter(|o| matches!(o, ConfirmOutcome::Confirmed(_)))
        .count();
    assert_eq!(confirmed, 1);
    assert!(outcomes.contains(&ConfirmOutcome::LinkInvalid));

    // A consumed token looks exactly like an unknown one.
    assert_eq!(
        validate_token(&public, &token, now).await.unwrap(),
        TokenLookup::NotFound
    );
    assert_eq!(
        confirm_dose(&public, &token, now).await.unwrap(),
        ConfirmOutcome::LinkInvalid
    );
}

#[tokio::test]
async fn test_expired_token_cannot_be_confirmed() {
    let db = db().await;
    let doses = SqlDoseRepository::new(db);
    let now = Utc::now();
    let dose = create_dose(&doses, &medication(), now, now, &settings(Duration::hours(1)))
        .await
        .unwrap();

    let outcome = confirm_dose(&doses, &dose.one_time_token, now + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(outcome, ConfirmOutcome::LinkInvalid);
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_public_routes_hide_the_failure_reason() {
    let db = db().await;
    let doses = SqlDoseRepository::new(db.clone());
    let now = Utc::now();
    let dose = create_dose(&doses, &medication(), now, now, &settings(Duration::hours(24)))
        .await
        .unwrap();
    let expired = create_dose(
        &doses,
        &medication(),
        now,
        now - Duration::hours(2),
        &settings(Duration::hours(1)),
    )
    .await
    .unwrap();

    let app = routes_with_repository(Some(SqlDoseRepository::new(
        db.with_capability(Capability::Restricted),
    )));

    let get = |token: &str| {
        Request::builder()
            .uri(format!("/doses/{}", token))
            .body(Body::empty())
            .unwrap()
    };
    let confirm = |token: &str| {
        Request::builder()
            .method("POST")
            .uri(format!("/doses/{}/confirm", token))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(get(&dose.one_time_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "valid");
    assert_eq!(json["dose"]["shortCode"], dose.short_code);
    assert!(json["dose"].get("userId").is_none());

    let expired_body = json_body(app.clone().oneshot(get(&expired.one_time_token)).await.unwrap()).await;
    let unknown = app.clone().oneshot(get("c0ffee00-0000-4000-8000-000000000000")).await.unwrap();
    assert_eq!(unknown.status(), StatusCode::GONE);
    let unknown_body = json_body(unknown).await;
    assert_eq!(expired_body, unknown_body);
    assert_eq!(unknown_body["message"], LINK_INVALID_MESSAGE);

    let first = app.clone().oneshot(confirm(&dose.one_time_token)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(json_body(first).await["status"], "confirmed");
    let second = app.oneshot(confirm(&dose.one_time_token)).await.unwrap();
    assert_eq!(second.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_disabled_routes_are_unavailable() {
    let app = routes_with_repository(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/doses/c0ffee00-0000-4000-8000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
}

impl SmsService for RecordingSms {
    fn send_sms(&self, to: &str, body: &str) -> BoxOutcome<'_, SmsResult> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        let result = SmsResult::sent(to, "fake-id");
        Box::pin(async move { result })
    }
}

async fn seed_owner(db: &DbClient, sms_opt_in: bool) {
    SqlProfileRepository::new(db.clone())
        .create(Profile {
            id: "user-1".to_string(),
            email: "owner@example.com".to_string(),
            phone: Some("+13123050403".to_string()),
            full_name: None,
            sms_opt_in,
            is_admin: false,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    SqlPetRepository::new(db.clone())
        .create(Pet {
            id: "pet-1".to_string(),
            user_id: "user-1".to_string(),
            name: "Biscuit".to_string(),
            species: Some("dog".to_string()),
            insurance_company: None,
            policy_number: None,
            healthy_paws_pet_id: None,
            pumpkin_account_number: None,
            spot_account_number: None,
            date_of_birth: None,
            adoption_date: None,
            spay_neuter_status: None,
        })
        .await
        .unwrap();
    SqlMedicationRepository::new(db.clone())
        .create(medication())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reminder_is_sent_and_logged() {
    let db = db().await;
    seed_owner(&db, true).await;
    let now = Utc::now();
    let settings = settings(Duration::hours(24));
    let dose = create_dose(&SqlDoseRepository::new(db.clone()), &medication(), now, now, &settings)
        .await
        .unwrap();

    let sms = RecordingSms::default();
    let report = send_dose_reminder(&db, Some(&sms), &settings, &dose.id, now)
        .await
        .unwrap();

    assert!(report.sent());
    let sent = sms.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+13123050403");
    assert!(sent[0].1.contains("for Biscuit"));
    assert!(sent[0]
        .1
        .contains(&format!("https://app.petclaims.app/confirm-dose/{}", dose.one_time_token)));
    assert!(sent[0].1.contains(&dose.short_code));

    let log = SqlReminderLogRepository::new(db).find_by_dose(&dose.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert!(log[0].success);
    assert_eq!(log[0].message_id.as_deref(), Some("fake-id"));
}

#[tokio::test]
async fn test_reminder_skipped_without_opt_in() {
    let db = db().await;
    seed_owner(&db, false).await;
    let now = Utc::now();
    let settings = settings(Duration::hours(24));
    let dose = create_dose(&SqlDoseRepository::new(db.clone()), &medication(), now, now, &settings)
        .await
        .unwrap();

    let sms = RecordingSms::default();
    let report = send_dose_reminder(&db, Some(&sms), &settings, &dose.id, now)
        .await
        .unwrap();

    assert!(!report.sent());
    assert!(report.skipped.is_some());
    assert!(sms.sent.lock().unwrap().is_empty());
    assert!(SqlReminderLogRepository::new(db)
        .find_by_dose(&dose.id)
        .await
        .unwrap()
        .is_empty());
}
