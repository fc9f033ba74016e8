// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use shared_config::AppConfig;
use shared_database::StoreError;
use shared_models::{AppError, Specialty};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking form as submitted by a patient. Fields stay raw strings so that
/// malformed input surfaces as a validation error rather than a JSON
/// rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub specialty: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub reason: String,
}

/// Whose upcoming appointments to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpcomingFilter {
    Doctor(String),
    Patient(String),
}

/// A booking request after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedSlot {
    pub specialty: Specialty,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found.")]
    PatientNotFound,

    #[error("No available {specialty} for {date} at {time}.")]
    NoAvailability {
        specialty: Specialty,
        date: NaiveDate,
        time: NaiveTime,
    },

    #[error("Appointment slot was taken by a concurrent booking")]
    ConflictDetected,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not authorized to {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AppointmentError::ConflictDetected,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let message = err.to_string();
        match err {
            AppointmentError::NotFound | AppointmentError::PatientNotFound => AppError::NotFound(message),
            AppointmentError::NoAvailability { .. } => AppError::NoAvailability(message),
            AppointmentError::ConflictDetected => AppError::Conflict(message),
            AppointmentError::InvalidTime(msg) | AppointmentError::ValidationError(msg) => {
                AppError::ValidationError(msg)
            }
            AppointmentError::Unauthorized(_) => AppError::Forbidden(message),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// BOOKING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingRules {
    /// Selection attempts before a booking that keeps losing slot races gives up.
    pub max_attempts: u32,
    /// Compare the full date and time against now instead of the date alone.
    pub reject_past_slot_times: bool,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            reject_past_slot_times: false,
        }
    }
}

impl From<&AppConfig> for BookingRules {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.booking_max_attempts.max(1),
            reject_past_slot_times: config.reject_past_slot_times,
        }
    }
}
