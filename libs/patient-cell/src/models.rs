use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::auth::Role;
use shared_models::{AppError, PatientProfile};

/// Signup form. Every field is required; missing ones deserialize empty so
/// the service can report them together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub national_health_id: String,
    pub date_of_birth: String,
}

impl SignupRequest {
    pub fn has_blank_field(&self) -> bool {
        [
            &self.name,
            &self.surname,
            &self.email,
            &self.username,
            &self.password,
            &self.national_health_id,
            &self.date_of_birth,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub patient: PatientProfile,
    pub token: String,
    pub role: Role,
    pub home: &'static str,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found!")]
    NotFound,

    #[error("Email or Username already in use")]
    AlreadyExists,

    #[error("All fields are required")]
    MissingFields,

    #[error("Invalid date of birth, expected YYYY-MM-DD")]
    InvalidDateOfBirth,

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for PatientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => PatientError::AlreadyExists,
            other => PatientError::DatabaseError(other.to_string()),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        let message = err.to_string();
        match err {
            PatientError::NotFound => AppError::NotFound(message),
            PatientError::AlreadyExists => AppError::Conflict(message),
            PatientError::MissingFields | PatientError::InvalidDateOfBirth => {
                AppError::ValidationError(message)
            }
            PatientError::Token(msg) => AppError::Internal(msg),
            PatientError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
