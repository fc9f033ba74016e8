use std::sync::Arc;
use axum::{
    extract::{State, Extension},
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, AppJson, AppPath};

use crate::models::SignupRequest;
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);

    let response = service.signup(request).await?;

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let service = PatientService::new(&state);
    let patients = service.list_patients().await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppPath(username): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let service = PatientService::new(&state);
    let removed = service.delete_patient(&username).await?;

    Ok(Json(json!({
        "success": true,
        "appointments_removed": removed,
        "message": "Patient and their appointments deleted successfully!"
    })))
}
