use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, AppJson, AppPath};

use crate::models::{ChangeCostRequest, ChangePasswordRequest, CreateDoctorRequest};
use crate::services::DoctorService;

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let service = DoctorService::new(&state);
    let doctor = service.create_doctor(request).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor added successfully!"
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let service = DoctorService::new(&state);
    let doctors = service.list_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn change_doctor_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppPath(username): AppPath<String>,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let service = DoctorService::new(&state);
    service.change_password(&username, &request.new_password).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor password changed successfully!"
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppPath(username): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Admin])?;

    let service = DoctorService::new(&state);
    let removed = service.delete_doctor(&username).await?;

    Ok(Json(json!({
        "success": true,
        "appointments_removed": removed,
        "message": "Doctor and their appointments deleted successfully!"
    })))
}

// ==============================================================================
// DOCTOR SELF-SERVICE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn change_own_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor])?;

    let service = DoctorService::new(&state);
    service.change_password(&user.username, &request.new_password).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Your password changed successfully!"
    })))
}

#[axum::debug_handler]
pub async fn change_own_cost(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<ChangeCostRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor])?;

    let service = DoctorService::new(&state);
    let change = service
        .change_cost(&user.username, &request.new_appointment_cost)
        .await?;

    Ok(Json(json!({
        "success": true,
        "doctor": change.doctor,
        "appointments_repriced": change.appointments_repriced,
        "message": "Appointment cost changed successfully!"
    })))
}
