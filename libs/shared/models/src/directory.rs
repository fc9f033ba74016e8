use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialty {
    Radiologist,
    Hematologist,
    Allergist,
    Pathologist,
    Cardiologist,
}

impl Specialty {
    pub const ALL: [Specialty; 5] = [
        Specialty::Radiologist,
        Specialty::Hematologist,
        Specialty::Allergist,
        Specialty::Pathologist,
        Specialty::Cardiologist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::Radiologist => "Radiologist",
            Specialty::Hematologist => "Hematologist",
            Specialty::Allergist => "Allergist",
            Specialty::Pathologist => "Pathologist",
            Specialty::Cardiologist => "Cardiologist",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Specialty should be one of these: Radiologist, Hematologist, Allergist, Pathologist, Cardiologist")]
pub struct InvalidSpecialty(pub String);

impl FromStr for Specialty {
    type Err = InvalidSpecialty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specialty::ALL
            .iter()
            .copied()
            .find(|specialty| specialty.as_str() == s.trim())
            .ok_or_else(|| InvalidSpecialty(s.to_string()))
    }
}

// ==============================================================================
// DIRECTORY RECORDS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub specialty: Specialty,
    pub appointment_cost: f64,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn profile(&self) -> DoctorProfile {
        DoctorProfile {
            id: self.id,
            name: self.name.clone(),
            surname: self.surname.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            specialty: self.specialty,
            appointment_cost: self.appointment_cost,
        }
    }
}

/// Doctor record as shown to callers; never carries the password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub specialty: Specialty,
    pub appointment_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub national_health_id: String,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn profile(&self) -> PatientProfile {
        PatientProfile {
            id: self.id,
            name: self.name.clone(),
            surname: self.surname.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            national_health_id: self.national_health_id.clone(),
            date_of_birth: self.date_of_birth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub national_health_id: String,
    pub date_of_birth: NaiveDate,
}

/// Credentials of whichever record owns a username, tagged with its role.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Identity {
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

impl From<&Admin> for Identity {
    fn from(admin: &Admin) -> Self {
        Self {
            username: admin.username.clone(),
            password: admin.password.clone(),
            role: Role::Admin,
        }
    }
}

impl From<&Doctor> for Identity {
    fn from(doctor: &Doctor) -> Self {
        Self {
            username: doctor.username.clone(),
            password: doctor.password.clone(),
            role: Role::Doctor,
        }
    }
}

impl From<&Patient> for Identity {
    fn from(patient: &Patient) -> Self {
        Self {
            username: patient.username.clone(),
            password: patient.password.clone(),
            role: Role::Patient,
        }
    }
}
