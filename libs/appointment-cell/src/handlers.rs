// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, AppJson, AppPath};

use crate::models::{BookAppointmentRequest, UpcomingFilter};
use crate::services::booking::AppointmentBookingService;

/// Book the first free doctor of a specialty for the calling patient.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient])?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .book_appointment(&user.username, request)
        .await?;

    let message = format!(
        "Appointment booked with Dr. {} {} on {} at {}.",
        appointment.doctor_name,
        appointment.doctor_surname,
        appointment.date,
        appointment.time.format("%H:%M")
    );

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn get_upcoming_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient, Role::Doctor])?;

    let filter = match user.role {
        Role::Doctor => UpcomingFilter::Doctor(user.username.clone()),
        _ => UpcomingFilter::Patient(user.username.clone()),
    };

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service.list_upcoming(filter).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    AppPath(appointment_id): AppPath<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient, Role::Doctor])?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(appointment_id, &user.username)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    AppPath(appointment_id): AppPath<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient])?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .cancel_appointment(appointment_id, &user.username)
        .await?;

    info!("Patient {} cancelled appointment {}", user.username, appointment_id);

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled."
    })))
}
