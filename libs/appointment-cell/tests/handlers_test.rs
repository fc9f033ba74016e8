use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use shared_database::AppState;
use shared_models::Specialty;
use shared_utils::test_utils::{Fixtures, JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: Router,
    secret: String,
}

impl TestApp {
    async fn new() -> Self {
        let config = TestConfig::default();
        let state = AppState::in_memory(config.to_app_config());

        state
            .directory
            .insert_doctor(Fixtures::doctor("house", Specialty::Cardiologist, 50.0))
            .await
            .unwrap();
        state.directory.insert_patient(Fixtures::patient("alice")).await.unwrap();
        state.directory.insert_patient(Fixtures::patient("bob")).await.unwrap();

        Self {
            router: appointment_routes(Arc::new(state)),
            secret: config.jwt_secret,
        }
    }

    async fn send(&self, method: &str, uri: &str, user: Option<&TestUser>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("Authorization", JwtTestUtils::bearer(user, &self.secret));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

fn booking(date: &str) -> Value {
    json!({
        "specialty": "Cardiologist",
        "date": date,
        "time": "10:00",
        "reason": "Checkup"
    })
}

#[tokio::test]
async fn test_book_requires_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send("POST", "/", None, Some(booking("2030-01-01"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_patient_books_and_second_patient_gets_conflict() {
    let app = TestApp::new().await;
    let alice = TestUser::patient("alice");
    let bob = TestUser::patient("bob");

    let (status, body) = app.send("POST", "/", Some(&alice), Some(booking("2030-01-01"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["doctor_username"], "house");
    assert_eq!(body["appointment"]["appointment_cost"], 50.0);

    let (status, body) = app.send("POST", "/", Some(&bob), Some(booking("2030-01-01"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("No available Cardiologist"));
}

#[tokio::test]
async fn test_doctor_cannot_book() {
    let app = TestApp::new().await;
    let doctor = TestUser::doctor("house");

    let (status, _) = app.send("POST", "/", Some(&doctor), Some(booking("2030-01-01"))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_form_is_bad_request() {
    let app = TestApp::new().await;
    let alice = TestUser::patient("alice");

    let (status, _) = app
        .send("POST", "/", Some(&alice), Some(json!({"specialty": "Dentist", "date": "2030-01-01", "time": "10:00"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send("POST", "/", Some(&alice), Some(booking(&Fixtures::date_from_today(-3))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Selected date must be valid.");
}

#[tokio::test]
async fn test_incomplete_body_and_bad_id_answer_with_json_errors() {
    let app = TestApp::new().await;
    let alice = TestUser::patient("alice");

    let (status, body) = app
        .send("POST", "/", Some(&alice), Some(json!({"specialty": "Cardiologist", "time": "10:00"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("date"));

    let (status, body) = app.send("DELETE", "/not-a-uuid", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.send("GET", "/not-a-uuid", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_upcoming_for_patient_and_doctor() {
    let app = TestApp::new().await;
    let alice = TestUser::patient("alice");
    let house = TestUser::doctor("house");
    let date = Fixtures::date_from_today(5);

    app.send("POST", "/", Some(&alice), Some(booking(&date))).await;

    let (status, body) = app.send("GET", "/upcoming", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["date"], date);

    let (status, body) = app.send("GET", "/upcoming", Some(&house), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointments"][0]["patient_username"], "alice");

    let admin = TestUser::admin("admin");
    let (status, _) = app.send("GET", "/upcoming", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_and_cancel_by_id() {
    let app = TestApp::new().await;
    let alice = TestUser::patient("alice");
    let bob = TestUser::patient("bob");

    let (_, body) = app.send("POST", "/", Some(&alice), Some(booking("2030-01-01"))).await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();
    let uri = format!("/{}", id);

    let (status, body) = app.send("GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, _) = app.send("GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.send("GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
