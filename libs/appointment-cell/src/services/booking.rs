// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::{AppState, AppointmentFilter, AppointmentStore, DirectoryStore, PatientFilter, StoreError};
use shared_models::{Appointment, Doctor, Patient};

use crate::models::{
    AppointmentError, BookAppointmentRequest, BookingRules, RequestedSlot, UpcomingFilter,
};
use crate::services::availability::AvailabilityService;
use crate::services::validation::{ensure_not_past, parse_request};

pub struct AppointmentBookingService {
    directory: Arc<dyn DirectoryStore>,
    appointments: Arc<dyn AppointmentStore>,
    availability: AvailabilityService,
    rules: BookingRules,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self::with_rules(
            Arc::clone(&state.directory),
            Arc::clone(&state.appointments),
            BookingRules::from(state.config.as_ref()),
        )
    }

    pub fn with_rules(
        directory: Arc<dyn DirectoryStore>,
        appointments: Arc<dyn AppointmentStore>,
        rules: BookingRules,
    ) -> Self {
        let availability = AvailabilityService::new(Arc::clone(&directory), Arc::clone(&appointments));

        Self {
            directory,
            appointments,
            availability,
            rules,
        }
    }

    /// Books the first free doctor of the requested specialty for the slot.
    ///
    /// The store's slot uniqueness is the real guard against double booking:
    /// when an insert loses a race, the doctor is excluded and selection runs
    /// again, up to `max_attempts` times.
    #[instrument(skip(self, request), fields(patient = %patient_username))]
    pub async fn book_appointment(
        &self,
        patient_username: &str,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.book_appointment_at(patient_username, request, Local::now().naive_local()).await
    }

    pub async fn book_appointment_at(
        &self,
        patient_username: &str,
        request: BookAppointmentRequest,
        now: NaiveDateTime,
    ) -> Result<Appointment, AppointmentError> {
        let slot = parse_request(&request)?;
        ensure_not_past(&slot, now, &self.rules)?;

        let patient = self
            .directory
            .find_patient(&PatientFilter::by_username(patient_username))
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        let mut excluded = self.availability.booked_doctors(slot.date, slot.time).await?;

        for attempt in 1..=self.rules.max_attempts {
            let doctor = self
                .availability
                .first_free_doctor(slot.specialty, &excluded)
                .await?
                .ok_or(AppointmentError::NoAvailability {
                    specialty: slot.specialty,
                    date: slot.date,
                    time: slot.time,
                })?;

            let appointment = compose_appointment(&patient, &doctor, &slot, &request.reason);

            match self.appointments.insert(appointment.clone()).await {
                Ok(id) => {
                    info!(
                        "Appointment {} booked with doctor {} at {} {}",
                        id, doctor.username, slot.date, slot.time
                    );
                    return Ok(appointment);
                }
                Err(StoreError::Conflict(reason)) => {
                    warn!(
                        "Doctor {} taken concurrently at {} {} (attempt {}/{}): {}",
                        doctor.username, slot.date, slot.time, attempt, self.rules.max_attempts, reason
                    );
                    excluded.push(doctor.username);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppointmentError::ConflictDetected)
    }

    /// Deletes an appointment on behalf of the patient who holds it.
    #[instrument(skip(self))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        requesting_username: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.patient_username != requesting_username {
            warn!("{} attempted to cancel appointment {} owned by {}",
                  requesting_username, appointment_id, appointment.patient_username);
            return Err(AppointmentError::Unauthorized("cancel this appointment".to_string()));
        }

        let deleted = self.appointments.delete_one(appointment_id).await?;
        if deleted == 0 {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} cancelled by {}", appointment_id, requesting_username);
        Ok(appointment)
    }

    /// Appointments dated today or later, earliest first.
    pub async fn list_upcoming(
        &self,
        filter: UpcomingFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let today = Local::now().date_naive();
        let store_filter = match &filter {
            UpcomingFilter::Doctor(username) => AppointmentFilter::for_doctor(username),
            UpcomingFilter::Patient(username) => AppointmentFilter::for_patient(username),
        }
        .from_date(today);

        let mut appointments = self.appointments.find(&store_filter).await?;
        appointments.sort_by_key(|a| a.starts_at());

        debug!("Found {} upcoming appointments for {:?}", appointments.len(), filter);
        Ok(appointments)
    }

    /// Appointment details, visible to the patient and the doctor on it.
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        requesting_username: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let is_party = appointment.patient_username == requesting_username
            || appointment.doctor_username == requesting_username;
        if !is_party {
            return Err(AppointmentError::Unauthorized("view this appointment".to_string()));
        }

        Ok(appointment)
    }
}

fn compose_appointment(
    patient: &Patient,
    doctor: &Doctor,
    slot: &RequestedSlot,
    reason: &str,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        date: slot.date,
        time: slot.time,
        patient_username: patient.username.clone(),
        doctor_username: doctor.username.clone(),
        patient_name: patient.name.clone(),
        patient_surname: patient.surname.clone(),
        doctor_name: doctor.name.clone(),
        doctor_surname: doctor.surname.clone(),
        doctor_specialty: doctor.specialty,
        appointment_cost: doctor.appointment_cost,
        reason: reason.trim().to_string(),
        created_at: Utc::now(),
    }
}
