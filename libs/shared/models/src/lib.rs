pub mod appointment;
pub mod auth;
pub mod directory;
pub mod error;

pub use appointment::Appointment;
pub use auth::{Role, User};
pub use directory::{Admin, Doctor, DoctorProfile, Identity, Patient, PatientProfile, Specialty};
pub use error::AppError;
