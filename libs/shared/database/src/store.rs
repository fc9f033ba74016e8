use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use shared_models::{Admin, Appointment, Doctor, Identity, Patient, Specialty};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid store configuration: {0}")]
    Configuration(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ==============================================================================
// FILTERS AND PATCHES
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorFilter {
    pub username: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<Specialty>,
    pub exclude_usernames: Vec<String>,
}

impl DoctorFilter {
    pub fn by_username(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Self::default()
        }
    }

    pub fn by_email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }

    /// Doctors of `specialty` whose username is not in `excluded`.
    pub fn available(specialty: Specialty, excluded: Vec<String>) -> Self {
        Self {
            specialty: Some(specialty),
            exclude_usernames: excluded,
            ..Self::default()
        }
    }

    pub fn matches(&self, doctor: &Doctor) -> bool {
        self.username.as_deref().map_or(true, |u| doctor.username == u)
            && self.email.as_deref().map_or(true, |e| doctor.email == e)
            && self.specialty.map_or(true, |s| doctor.specialty == s)
            && !self.exclude_usernames.iter().any(|u| *u == doctor.username)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientFilter {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl PatientFilter {
    pub fn by_username(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Self::default()
        }
    }

    pub fn by_email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        self.username.as_deref().map_or(true, |u| patient.username == u)
            && self.email.as_deref().map_or(true, |e| patient.email == e)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorPatch {
    pub password: Option<String>,
    pub appointment_cost: Option<f64>,
}

impl DoctorPatch {
    pub fn is_empty(&self) -> bool {
        self.password.is_none() && self.appointment_cost.is_none()
    }

    /// Applies the patch and reports whether anything changed.
    pub fn apply(&self, doctor: &mut Doctor) -> bool {
        let mut modified = false;
        if let Some(password) = &self.password {
            if doctor.password != *password {
                doctor.password = password.clone();
                modified = true;
            }
        }
        if let Some(cost) = self.appointment_cost {
            if doctor.appointment_cost != cost {
                doctor.appointment_cost = cost;
                modified = true;
            }
        }
        modified
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub id: Option<Uuid>,
    pub doctor_username: Option<String>,
    pub patient_username: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub from_date: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn at_slot(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date: Some(date),
            time: Some(time),
            ..Self::default()
        }
    }

    pub fn for_doctor(doctor_username: &str) -> Self {
        Self {
            doctor_username: Some(doctor_username.to_string()),
            ..Self::default()
        }
    }

    pub fn for_patient(patient_username: &str) -> Self {
        Self {
            patient_username: Some(patient_username.to_string()),
            ..Self::default()
        }
    }

    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.id.map_or(true, |id| appointment.id == id)
            && self.doctor_username.as_deref().map_or(true, |u| appointment.doctor_username == u)
            && self.patient_username.as_deref().map_or(true, |u| appointment.patient_username == u)
            && self.date.map_or(true, |d| appointment.date == d)
            && self.time.map_or(true, |t| appointment.time == t)
            && self.from_date.map_or(true, |d| appointment.date >= d)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPatch {
    pub appointment_cost: Option<f64>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self.appointment_cost.is_none()
    }

    pub fn apply(&self, appointment: &mut Appointment) -> bool {
        match self.appointment_cost {
            Some(cost) if appointment.appointment_cost != cost => {
                appointment.appointment_cost = cost;
                true
            }
            _ => false,
        }
    }
}

// ==============================================================================
// STORE TRAITS
// ==============================================================================

/// Admin, doctor and patient records. Usernames are unique across all three.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Resolves a username to its owning record, admins first, then doctors,
    /// then patients.
    async fn find_identity(&self, username: &str) -> StoreResult<Option<Identity>>;

    async fn find_admin(&self, username: &str) -> StoreResult<Option<Admin>>;

    async fn insert_admin(&self, admin: Admin) -> StoreResult<Uuid>;

    /// First matching doctor in insertion order.
    async fn find_doctor(&self, filter: &DoctorFilter) -> StoreResult<Option<Doctor>>;

    async fn list_doctors(&self, filter: &DoctorFilter) -> StoreResult<Vec<Doctor>>;

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Uuid>;

    /// Returns the number of modified records.
    async fn update_doctor(&self, username: &str, patch: &DoctorPatch) -> StoreResult<u64>;

    async fn delete_doctor(&self, username: &str) -> StoreResult<u64>;

    async fn find_patient(&self, filter: &PatientFilter) -> StoreResult<Option<Patient>>;

    async fn list_patients(&self) -> StoreResult<Vec<Patient>>;

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Uuid>;

    async fn delete_patient(&self, username: &str) -> StoreResult<u64>;
}

/// Appointment records. Implementations reject a second appointment for the
/// same (doctor_username, date, time) with [`StoreError::Conflict`].
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>>;

    async fn insert(&self, appointment: Appointment) -> StoreResult<Uuid>;

    async fn delete_one(&self, id: Uuid) -> StoreResult<u64>;

    async fn delete_many(&self, filter: &AppointmentFilter) -> StoreResult<u64>;

    async fn update_many(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
    ) -> StoreResult<u64>;
}
