use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{AppState, AppointmentFilter, AppointmentStore, DirectoryStore, PatientFilter};
use shared_models::auth::Role;
use shared_models::{Patient, PatientProfile};
use shared_utils::jwt::issue_token;

use crate::models::{PatientError, SignupRequest, SignupResponse};

pub struct PatientService {
    config: Arc<AppConfig>,
    directory: Arc<dyn DirectoryStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl PatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: Arc::clone(&state.config),
            directory: Arc::clone(&state.directory),
            appointments: Arc::clone(&state.appointments),
        }
    }

    /// Registers a patient and logs them in.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupResponse, PatientError> {
        if request.has_blank_field() {
            return Err(PatientError::MissingFields);
        }

        let date_of_birth = NaiveDate::parse_from_str(request.date_of_birth.trim(), "%Y-%m-%d")
            .map_err(|_| PatientError::InvalidDateOfBirth)?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        if self.directory.find_identity(&username).await?.is_some()
            || self.directory.find_patient(&PatientFilter::by_email(&email)).await?.is_some()
        {
            debug!("Signup rejected, username or email taken");
            return Err(PatientError::AlreadyExists);
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            surname: request.surname.trim().to_string(),
            email,
            username,
            password: request.password,
            national_health_id: request.national_health_id.trim().to_string(),
            date_of_birth,
            created_at: Utc::now(),
        };

        self.directory.insert_patient(patient.clone()).await?;

        let token = issue_token(
            &patient.username,
            Role::Patient,
            &self.config.jwt_secret,
            self.config.token_ttl_hours,
        )
        .map_err(PatientError::Token)?;

        info!("Patient {} ({}) signed up", patient.full_name(), patient.username);

        Ok(SignupResponse {
            patient: patient.profile(),
            token,
            role: Role::Patient,
            home: Role::Patient.home_path(),
        })
    }

    pub async fn list_patients(&self) -> Result<Vec<PatientProfile>, PatientError> {
        let patients = self.directory.list_patients().await?;
        Ok(patients.iter().map(Patient::profile).collect())
    }

    /// Removes the patient together with every appointment they hold.
    /// Returns the number of appointments removed.
    ///
    /// The record goes first so no new booking can name this patient; one
    /// already past its patient lookup may still insert before the cascade.
    #[instrument(skip(self))]
    pub async fn delete_patient(&self, username: &str) -> Result<u64, PatientError> {
        if self.directory.delete_patient(username).await? == 0 {
            return Err(PatientError::NotFound);
        }

        let removed = self
            .appointments
            .delete_many(&AppointmentFilter::for_patient(username))
            .await?;

        info!("Patient {} deleted along with {} appointment(s)", username, removed);
        Ok(removed)
    }
}
