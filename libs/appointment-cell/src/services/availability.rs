// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use shared_database::{AppointmentFilter, AppointmentStore, DirectoryStore, DoctorFilter};
use shared_models::{Doctor, Specialty};

use crate::models::AppointmentError;

/// Answers "who is free at this slot" from the two stores.
pub struct AvailabilityService {
    directory: Arc<dyn DirectoryStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl AvailabilityService {
    pub fn new(directory: Arc<dyn DirectoryStore>, appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { directory, appointments }
    }

    /// Usernames of doctors holding an appointment at exactly (date, time).
    pub async fn booked_doctors(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Vec<String>, AppointmentError> {
        let booked = self.appointments.find(&AppointmentFilter::at_slot(date, time)).await?;

        let mut usernames: Vec<String> = booked.into_iter().map(|a| a.doctor_username).collect();
        usernames.sort();
        usernames.dedup();

        debug!("{} doctor(s) already booked at {} {}", usernames.len(), date, time);
        Ok(usernames)
    }

    /// First doctor of `specialty`, in store insertion order, not in `excluded`.
    pub async fn first_free_doctor(
        &self,
        specialty: Specialty,
        excluded: &[String],
    ) -> Result<Option<Doctor>, AppointmentError> {
        let filter = DoctorFilter::available(specialty, excluded.to_vec());
        Ok(self.directory.find_doctor(&filter).await?)
    }
}
