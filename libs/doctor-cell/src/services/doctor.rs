use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{
    AppState, AppointmentFilter, AppointmentPatch, AppointmentStore, DirectoryStore, DoctorFilter,
    DoctorPatch,
};
use shared_models::{Doctor, DoctorProfile, Specialty};

use crate::models::{CostChange, CostInput, CreateDoctorRequest, DoctorError};

pub struct DoctorService {
    config: Arc<AppConfig>,
    directory: Arc<dyn DirectoryStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: Arc::clone(&state.config),
            directory: Arc::clone(&state.directory),
            appointments: Arc::clone(&state.appointments),
        }
    }

    /// Create a new doctor account
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<DoctorProfile, DoctorError> {
        if request.has_blank_field() {
            return Err(DoctorError::MissingFields);
        }

        let specialty = request
            .specialty
            .parse::<Specialty>()
            .map_err(|e| DoctorError::InvalidSpecialty(e.to_string()))?;

        let appointment_cost = request
            .appointment_cost
            .as_ref()
            .ok_or(DoctorError::MissingFields)?
            .parse()?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        if self.directory.find_identity(&username).await?.is_some()
            || self.directory.find_doctor(&DoctorFilter::by_email(&email)).await?.is_some()
        {
            debug!("Doctor username or email already registered");
            return Err(DoctorError::AlreadyExists);
        }

        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            surname: request.surname.trim().to_string(),
            email,
            username,
            password: request.password,
            specialty,
            appointment_cost,
            created_at: Utc::now(),
        };

        self.directory.insert_doctor(doctor.clone()).await?;
        info!("Doctor {} ({}) added as {}", doctor.full_name(), doctor.username, doctor.specialty);

        Ok(doctor.profile())
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorProfile>, DoctorError> {
        let doctors = self.directory.list_doctors(&DoctorFilter::default()).await?;
        Ok(doctors.iter().map(Doctor::profile).collect())
    }

    async fn get_doctor(&self, username: &str) -> Result<Doctor, DoctorError> {
        self.directory
            .find_doctor(&DoctorFilter::by_username(username))
            .await?
            .ok_or(DoctorError::NotFound)
    }

    /// Used both by admins (any doctor) and by a doctor on their own account.
    #[instrument(skip(self, new_password))]
    pub async fn change_password(&self, username: &str, new_password: &str) -> Result<(), DoctorError> {
        if new_password.trim().is_empty() {
            return Err(DoctorError::MissingFields);
        }

        let doctor = self.get_doctor(username).await?;
        if doctor.password == new_password {
            return Err(DoctorError::Unchanged("password"));
        }

        let patch = DoctorPatch {
            password: Some(new_password.to_string()),
            ..DoctorPatch::default()
        };
        if self.directory.update_doctor(username, &patch).await? == 0 {
            return Err(DoctorError::Unchanged("password"));
        }

        info!("Password changed for doctor {}", username);
        Ok(())
    }

    /// Sets a new appointment cost. Booked appointments keep the cost they
    /// were booked at unless repricing is switched on.
    #[instrument(skip(self))]
    pub async fn change_cost(&self, username: &str, input: &CostInput) -> Result<CostChange, DoctorError> {
        let cost = input.parse()?;

        let mut doctor = self.get_doctor(username).await?;
        if doctor.appointment_cost == cost {
            return Err(DoctorError::Unchanged("appointment cost"));
        }

        let patch = DoctorPatch {
            appointment_cost: Some(cost),
            ..DoctorPatch::default()
        };
        if self.directory.update_doctor(username, &patch).await? == 0 {
            return Err(DoctorError::Unchanged("appointment cost"));
        }
        doctor.appointment_cost = cost;

        let appointments_repriced = if self.config.reprice_appointments_on_cost_change {
            let repriced = self
                .appointments
                .update_many(
                    &AppointmentFilter::for_doctor(username),
                    &AppointmentPatch { appointment_cost: Some(cost) },
                )
                .await?;
            warn!("Repriced {} existing appointment(s) of doctor {}", repriced, username);
            repriced
        } else {
            0
        };

        info!("Appointment cost of doctor {} set to {}", username, cost);
        Ok(CostChange {
            doctor: doctor.profile(),
            appointments_repriced,
        })
    }

    /// Removes the doctor, then the doctor's appointments. Returns the number
    /// of appointments removed.
    ///
    /// The two deletes are separate store calls. A booking that selected this
    /// doctor before the first delete can still land before the second one.
    #[instrument(skip(self))]
    pub async fn delete_doctor(&self, username: &str) -> Result<u64, DoctorError> {
        if self.directory.delete_doctor(username).await? == 0 {
            return Err(DoctorError::NotFound);
        }

        let removed = self
            .appointments
            .delete_many(&AppointmentFilter::for_doctor(username))
            .await?;

        info!("Doctor {} deleted along with {} appointment(s)", username, removed);
        Ok(removed)
    }
}
