use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use mockall::mock;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use patient_cell::models::{PatientError, SignupRequest};
use patient_cell::router::create_patient_router;
use patient_cell::services::PatientService;
use shared_database::{
    AppState, AppointmentFilter, AppointmentPatch, AppointmentStore, StoreError, StoreResult,
};
use shared_models::auth::Role;
use shared_models::{Appointment, Specialty};
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{Fixtures, JwtTestUtils, TestConfig, TestUser};

fn state() -> AppState {
    AppState::in_memory(TestConfig::default().to_app_config())
}

fn signup_request(username: &str, email: &str) -> SignupRequest {
    SignupRequest {
        name: "Maria".to_string(),
        surname: "Papadopoulou".to_string(),
        email: email.to_string(),
        username: username.to_string(),
        password: "secret".to_string(),
        national_health_id: "01019012345".to_string(),
        date_of_birth: "1990-01-01".to_string(),
    }
}

fn appointment_for(patient: &str, doctor: &str, hour: u32) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        patient_username: patient.to_string(),
        doctor_username: doctor.to_string(),
        patient_name: "Maria".to_string(),
        patient_surname: "Papadopoulou".to_string(),
        doctor_name: "Greg".to_string(),
        doctor_surname: "House".to_string(),
        doctor_specialty: Specialty::Cardiologist,
        appointment_cost: 50.0,
        reason: String::new(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_signup_returns_profile_and_patient_token() {
    let state = state();
    let service = PatientService::new(&state);

    let response = service.signup(signup_request("maria", "maria@mail.test")).await.unwrap();

    assert_eq!(response.patient.username, "maria");
    assert_eq!(response.patient.date_of_birth, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
    assert_eq!(response.role, Role::Patient);

    let user = validate_token(&response.token, &state.config.jwt_secret).unwrap();
    assert_eq!(user.username, "maria");
    assert!(user.is_patient());
}

#[tokio::test]
async fn test_signup_requires_every_field() {
    let service = PatientService::new(&state());
    let mut request = signup_request("maria", "maria@mail.test");
    request.national_health_id = "  ".to_string();

    assert_matches!(service.signup(request).await, Err(PatientError::MissingFields));

    let mut request = signup_request("maria", "maria@mail.test");
    request.date_of_birth = "01/01/1990".to_string();
    assert_matches!(service.signup(request).await, Err(PatientError::InvalidDateOfBirth));
}

#[tokio::test]
async fn test_signup_rejects_taken_username_or_email() {
    let state = state();
    state
        .directory
        .insert_doctor(Fixtures::doctor("house", Specialty::Cardiologist, 50.0))
        .await
        .unwrap();
    let service = PatientService::new(&state);

    service.signup(signup_request("maria", "maria@mail.test")).await.unwrap();

    assert_matches!(
        service.signup(signup_request("maria", "other@mail.test")).await,
        Err(PatientError::AlreadyExists)
    );
    assert_matches!(
        service.signup(signup_request("eleni", "maria@mail.test")).await,
        Err(PatientError::AlreadyExists)
    );
    // Doctor usernames are taken too.
    assert_matches!(
        service.signup(signup_request("house", "house@mail.test")).await,
        Err(PatientError::AlreadyExists)
    );
}

#[tokio::test]
async fn test_delete_patient_cascades_to_appointments() {
    let state = state();
    state.directory.insert_patient(Fixtures::patient("maria")).await.unwrap();
    state.directory.insert_patient(Fixtures::patient("eleni")).await.unwrap();
    state.appointments.insert(appointment_for("maria", "house", 9)).await.unwrap();
    state.appointments.insert(appointment_for("maria", "house", 10)).await.unwrap();
    state.appointments.insert(appointment_for("eleni", "house", 11)).await.unwrap();
    let service = PatientService::new(&state);

    let removed = service.delete_patient("maria").await.unwrap();

    assert_eq!(removed, 2);
    assert!(state
        .appointments
        .find(&AppointmentFilter::for_patient("maria"))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(state.appointments.find(&AppointmentFilter::for_patient("eleni")).await.unwrap().len(), 1);
    assert_eq!(service.list_patients().await.unwrap().len(), 1);

    assert_matches!(service.delete_patient("maria").await, Err(PatientError::NotFound));
}

mock! {
    pub Appointments {}

    #[async_trait]
    impl AppointmentStore for Appointments {
        async fn find(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;
        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>>;
        async fn insert(&self, appointment: Appointment) -> StoreResult<Uuid>;
        async fn delete_one(&self, id: Uuid) -> StoreResult<u64>;
        async fn delete_many(&self, filter: &AppointmentFilter) -> StoreResult<u64>;
        async fn update_many(
            &self,
            filter: &AppointmentFilter,
            patch: &AppointmentPatch,
        ) -> StoreResult<u64>;
    }
}

fn failing_cascade() -> MockAppointments {
    let mut appointments = MockAppointments::new();
    appointments
        .expect_delete_many()
        .times(1)
        .returning(|_| Err(StoreError::Backend { status: 503, message: "unavailable".to_string() }));
    appointments
}

#[tokio::test]
async fn test_delete_patient_removes_record_before_cascading() {
    let seeded = state();
    seeded.directory.insert_patient(Fixtures::patient("maria")).await.unwrap();
    let state = AppState::new(
        TestConfig::default().to_app_config(),
        Arc::clone(&seeded.directory),
        Arc::new(failing_cascade()),
    );
    let service = PatientService::new(&state);

    assert_matches!(service.delete_patient("maria").await, Err(PatientError::DatabaseError(_)));
    assert!(state.directory.find_identity("maria").await.unwrap().is_none());

    assert_matches!(service.delete_patient("maria").await, Err(PatientError::NotFound));
}

async fn call(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_patient_router(Arc::new(state)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_signup_endpoint_is_public() {
    let body = json!({
        "name": "Maria",
        "surname": "Papadopoulou",
        "email": "maria@mail.test",
        "username": "maria",
        "password": "secret",
        "national_health_id": "01019012345",
        "date_of_birth": "1990-01-01"
    });
    let request = Request::builder()
        .method("POST")
        .uri("/signup")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, body) = call(state(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient"]["username"], "maria");
    assert_eq!(body["role"], "patient");
    assert!(body["patient"].get("password").is_none());
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_signup_endpoint_reports_missing_fields() {
    let request = Request::builder()
        .method("POST")
        .uri("/signup")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"username": "maria"}).to_string()))
        .unwrap();

    let (status, body) = call(state(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All fields are required");
}

#[tokio::test]
async fn test_listing_patients_is_admin_only() {
    let state = state();
    let secret = state.config.jwt_secret.clone();
    state.directory.insert_patient(Fixtures::patient("maria")).await.unwrap();

    let as_patient = Request::builder()
        .uri("/")
        .header("Authorization", JwtTestUtils::bearer(&TestUser::patient("maria"), &secret))
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(state.clone(), as_patient).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let as_admin = Request::builder()
        .uri("/")
        .header("Authorization", JwtTestUtils::bearer(&TestUser::admin("admin"), &secret))
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(state, as_admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["patients"][0]["username"], "maria");
}

#[tokio::test]
async fn test_delete_endpoint_unknown_patient() {
    let state = state();
    let secret = state.config.jwt_secret.clone();
    let request = Request::builder()
        .method("DELETE")
        .uri("/ghost")
        .header("Authorization", JwtTestUtils::bearer(&TestUser::admin("admin"), &secret))
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(state, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Patient not found!");
}
