use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::{AppError, DoctorProfile};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Appointment cost as submitted: forms send text, API clients send numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CostInput {
    Number(f64),
    Text(String),
}

impl CostInput {
    /// A finite cost strictly above zero.
    pub fn parse(&self) -> Result<f64, DoctorError> {
        let value = match self {
            CostInput::Number(value) => *value,
            CostInput::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| DoctorError::InvalidCost)?,
        };

        if !value.is_finite() {
            return Err(DoctorError::InvalidCost);
        }
        if value <= 0.0 {
            return Err(DoctorError::NonPositiveCost);
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub specialty: String,
    pub appointment_cost: Option<CostInput>,
}

impl CreateDoctorRequest {
    pub fn has_blank_field(&self) -> bool {
        let blank_cost = match &self.appointment_cost {
            None => true,
            Some(CostInput::Text(raw)) => raw.trim().is_empty(),
            Some(CostInput::Number(_)) => false,
        };

        blank_cost
            || [
                &self.name,
                &self.surname,
                &self.email,
                &self.username,
                &self.password,
                &self.specialty,
            ]
            .iter()
            .any(|field| field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeCostRequest {
    pub new_appointment_cost: CostInput,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CostChange {
    pub doctor: DoctorProfile,
    /// Existing appointments whose cost snapshot was rewritten.
    pub appointments_repriced: u64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found!")]
    NotFound,

    #[error("Username or email already exists!")]
    AlreadyExists,

    #[error("All fields are required!")]
    MissingFields,

    #[error("{0}")]
    InvalidSpecialty(String),

    #[error("Appointment cost must be a valid number!")]
    InvalidCost,

    #[error("Appointment cost must be a positive number!")]
    NonPositiveCost,

    #[error("Failed to change {0}!")]
    Unchanged(&'static str),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for DoctorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => DoctorError::AlreadyExists,
            other => DoctorError::DatabaseError(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        let message = err.to_string();
        match err {
            DoctorError::NotFound => AppError::NotFound(message),
            DoctorError::AlreadyExists => AppError::Conflict(message),
            DoctorError::MissingFields
            | DoctorError::InvalidSpecialty(_)
            | DoctorError::InvalidCost
            | DoctorError::NonPositiveCost
            | DoctorError::Unchanged(_) => AppError::ValidationError(message),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_cost_accepts_numbers_and_numeric_text() {
        assert_eq!(CostInput::Number(50.0).parse().unwrap(), 50.0);
        assert_eq!(CostInput::Text(" 42.5 ".to_string()).parse().unwrap(), 42.5);
    }

    #[test]
    fn test_cost_rejects_garbage_and_non_positive_values() {
        assert_matches!(CostInput::Text("fifty".to_string()).parse(), Err(DoctorError::InvalidCost));
        assert_matches!(CostInput::Text("NaN".to_string()).parse(), Err(DoctorError::InvalidCost));
        assert_matches!(CostInput::Number(0.0).parse(), Err(DoctorError::NonPositiveCost));
        assert_matches!(CostInput::Text("-3".to_string()).parse(), Err(DoctorError::NonPositiveCost));
    }

    #[test]
    fn test_cost_deserializes_from_either_shape() {
        let number: ChangeCostRequest = serde_json::from_str(r#"{"new_appointment_cost": 70}"#).unwrap();
        let text: ChangeCostRequest = serde_json::from_str(r#"{"new_appointment_cost": "70"}"#).unwrap();

        assert_eq!(number.new_appointment_cost, CostInput::Number(70.0));
        assert_eq!(text.new_appointment_cost, CostInput::Text("70".to_string()));
    }

    #[test]
    fn test_blank_fields_detected() {
        let request = CreateDoctorRequest {
            name: "Greg".to_string(),
            surname: "House".to_string(),
            email: "house@clinic.test".to_string(),
            username: "house".to_string(),
            password: "vicodin".to_string(),
            specialty: "Cardiologist".to_string(),
            appointment_cost: Some(CostInput::Text(String::new())),
        };
        assert!(request.has_blank_field());

        let complete = CreateDoctorRequest {
            appointment_cost: Some(CostInput::Number(50.0)),
            ..request
        };
        assert!(!complete.has_blank_field());
    }
}
