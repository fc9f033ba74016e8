use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::Specialty;

/// A booked slot. Patient and doctor fields are copies taken at booking time,
/// not references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub patient_username: String,
    pub doctor_username: String,
    pub patient_name: String,
    pub patient_surname: String,
    pub doctor_name: String,
    pub doctor_surname: String,
    pub doctor_specialty: Specialty,
    pub appointment_cost: f64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn occupies(&self, doctor_username: &str, date: NaiveDate, time: NaiveTime) -> bool {
        self.doctor_username == doctor_username && self.date == date && self.time == time
    }
}
