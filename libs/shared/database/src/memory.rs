use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::{Admin, Appointment, Doctor, Identity, Patient};

use crate::store::{
    AppointmentFilter, AppointmentPatch, AppointmentStore, DirectoryStore, DoctorFilter,
    DoctorPatch, PatientFilter, StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct Collections {
    admins: Vec<Admin>,
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
}

impl Collections {
    fn username_taken(&self, username: &str) -> bool {
        self.admins.iter().any(|a| a.username == username)
            || self.doctors.iter().any(|d| d.username == username)
            || self.patients.iter().any(|p| p.username == username)
    }
}

/// Process-local store backing both traits. All collections sit behind one
/// lock so uniqueness checks and inserts happen atomically. Records keep
/// insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn find_identity(&self, username: &str) -> StoreResult<Option<Identity>> {
        let inner = self.inner.read().await;

        let identity = inner
            .admins
            .iter()
            .find(|a| a.username == username)
            .map(Identity::from)
            .or_else(|| inner.doctors.iter().find(|d| d.username == username).map(Identity::from))
            .or_else(|| inner.patients.iter().find(|p| p.username == username).map(Identity::from));

        Ok(identity)
    }

    async fn find_admin(&self, username: &str) -> StoreResult<Option<Admin>> {
        let inner = self.inner.read().await;
        Ok(inner.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn insert_admin(&self, admin: Admin) -> StoreResult<Uuid> {
        let mut inner = self.inner.write().await;
        if inner.username_taken(&admin.username) {
            return Err(StoreError::Conflict(format!("username {} already exists", admin.username)));
        }

        let id = admin.id;
        inner.admins.push(admin);
        Ok(id)
    }

    async fn find_doctor(&self, filter: &DoctorFilter) -> StoreResult<Option<Doctor>> {
        let inner = self.inner.read().await;
        Ok(inner.doctors.iter().find(|d| filter.matches(d)).cloned())
    }

    async fn list_doctors(&self, filter: &DoctorFilter) -> StoreResult<Vec<Doctor>> {
        let inner = self.inner.read().await;
        Ok(inner.doctors.iter().filter(|d| filter.matches(d)).cloned().collect())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Uuid> {
        let mut inner = self.inner.write().await;
        if inner.username_taken(&doctor.username) {
            return Err(StoreError::Conflict(format!("username {} already exists", doctor.username)));
        }
        if inner.doctors.iter().any(|d| d.email == doctor.email) {
            return Err(StoreError::Conflict(format!("doctor email {} already exists", doctor.email)));
        }

        let id = doctor.id;
        debug!("Inserting doctor {} ({})", doctor.username, id);
        inner.doctors.push(doctor);
        Ok(id)
    }

    async fn update_doctor(&self, username: &str, patch: &DoctorPatch) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let modified = inner
            .doctors
            .iter_mut()
            .filter(|d| d.username == username)
            .map(|d| patch.apply(d))
            .filter(|changed| *changed)
            .count();

        Ok(modified as u64)
    }

    async fn delete_doctor(&self, username: &str) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.doctors.len();
        inner.doctors.retain(|d| d.username != username);
        Ok((before - inner.doctors.len()) as u64)
    }

    async fn find_patient(&self, filter: &PatientFilter) -> StoreResult<Option<Patient>> {
        let inner = self.inner.read().await;
        Ok(inner.patients.iter().find(|p| filter.matches(p)).cloned())
    }

    async fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        let inner = self.inner.read().await;
        Ok(inner.patients.clone())
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Uuid> {
        let mut inner = self.inner.write().await;
        if inner.username_taken(&patient.username) {
            return Err(StoreError::Conflict(format!("username {} already exists", patient.username)));
        }
        if inner.patients.iter().any(|p| p.email == patient.email) {
            return Err(StoreError::Conflict(format!("patient email {} already exists", patient.email)));
        }

        let id = patient.id;
        debug!("Inserting patient {} ({})", patient.username, id);
        inner.patients.push(patient);
        Ok(id)
    }

    async fn delete_patient(&self, username: &str) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.patients.len();
        inner.patients.retain(|p| p.username != username);
        Ok((before - inner.patients.len()) as u64)
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn find(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let inner = self.inner.read().await;
        Ok(inner.appointments.iter().filter(|a| filter.matches(a)).cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let inner = self.inner.read().await;
        Ok(inner.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, appointment: Appointment) -> StoreResult<Uuid> {
        let mut inner = self.inner.write().await;

        let slot_taken = inner.appointments.iter().any(|a| {
            a.occupies(&appointment.doctor_username, appointment.date, appointment.time)
        });
        if slot_taken {
            return Err(StoreError::Conflict(format!(
                "doctor {} already booked at {} {}",
                appointment.doctor_username, appointment.date, appointment.time
            )));
        }

        let id = appointment.id;
        inner.appointments.push(appointment);
        Ok(id)
    }

    async fn delete_one(&self, id: Uuid) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        match inner.appointments.iter().position(|a| a.id == id) {
            Some(index) => {
                inner.appointments.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: &AppointmentFilter) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.appointments.len();
        inner.appointments.retain(|a| !filter.matches(a));
        Ok((before - inner.appointments.len()) as u64)
    }

    async fn update_many(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let modified = inner
            .appointments
            .iter_mut()
            .filter(|a| filter.matches(a))
            .map(|a| patch.apply(a))
            .filter(|changed| *changed)
            .count();

        Ok(modified as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use shared_models::{Role, Specialty};

    fn doctor(username: &str, specialty: Specialty, cost: f64) -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            name: "Name".to_string(),
            surname: "Surname".to_string(),
            email: format!("{}@clinic.test", username),
            username: username.to_string(),
            password: "secret".to_string(),
            specialty,
            appointment_cost: cost,
            created_at: Utc::now(),
        }
    }

    fn patient(username: &str) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            name: "Pat".to_string(),
            surname: "Ient".to_string(),
            email: format!("{}@mail.test", username),
            username: username.to_string(),
            password: "pw".to_string(),
            national_health_id: "12345678901".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn appointment(doctor: &str, patient: &str, date: NaiveDate, time: NaiveTime) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            date,
            time,
            patient_username: patient.to_string(),
            doctor_username: doctor.to_string(),
            patient_name: "Pat".to_string(),
            patient_surname: "Ient".to_string(),
            doctor_name: "Name".to_string(),
            doctor_surname: "Surname".to_string(),
            doctor_specialty: Specialty::Cardiologist,
            appointment_cost: 50.0,
            reason: "checkup".to_string(),
            created_at: Utc::now(),
        }
    }

    fn slot() -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_rejects_second_appointment_in_same_slot() {
        let store = InMemoryStore::new();
        let (date, time) = slot();

        store.insert(appointment("d1", "p1", date, time)).await.unwrap();
        let result = store.insert(appointment("d1", "p2", date, time)).await;

        assert_matches!(result, Err(StoreError::Conflict(_)));
        // A different doctor in the same slot is fine.
        store.insert(appointment("d2", "p2", date, time)).await.unwrap();
    }

    #[tokio::test]
    async fn test_usernames_unique_across_record_kinds() {
        let store = InMemoryStore::new();
        store.insert_patient(patient("shared")).await.unwrap();

        let result = store.insert_doctor(doctor("shared", Specialty::Allergist, 10.0)).await;
        assert_matches!(result, Err(StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_doctor_respects_insertion_order_and_exclusions() {
        let store = InMemoryStore::new();
        store.insert_doctor(doctor("first", Specialty::Cardiologist, 50.0)).await.unwrap();
        store.insert_doctor(doctor("other", Specialty::Radiologist, 70.0)).await.unwrap();
        store.insert_doctor(doctor("second", Specialty::Cardiologist, 60.0)).await.unwrap();

        let found = store
            .find_doctor(&DoctorFilter::available(Specialty::Cardiologist, vec![]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.username, "first");

        let found = store
            .find_doctor(&DoctorFilter::available(Specialty::Cardiologist, vec!["first".to_string()]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.username, "second");

        let none = store
            .find_doctor(&DoctorFilter::available(
                Specialty::Cardiologist,
                vec!["first".to_string(), "second".to_string()],
            ))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_find_identity_resolves_role() {
        let store = InMemoryStore::new();
        store
            .insert_admin(Admin { id: Uuid::new_v4(), username: "admin".into(), password: "@dm1n".into() })
            .await
            .unwrap();
        store.insert_doctor(doctor("doc", Specialty::Pathologist, 30.0)).await.unwrap();
        store.insert_patient(patient("pat")).await.unwrap();

        assert_eq!(store.find_identity("admin").await.unwrap().unwrap().role, Role::Admin);
        assert_eq!(store.find_identity("doc").await.unwrap().unwrap().role, Role::Doctor);
        assert_eq!(store.find_identity("pat").await.unwrap().unwrap().role, Role::Patient);
        assert!(store.find_identity("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_doctor_counts_only_real_changes() {
        let store = InMemoryStore::new();
        store.insert_doctor(doctor("doc", Specialty::Pathologist, 30.0)).await.unwrap();

        let same = DoctorPatch { appointment_cost: Some(30.0), ..Default::default() };
        assert_eq!(store.update_doctor("doc", &same).await.unwrap(), 0);

        let changed = DoctorPatch { appointment_cost: Some(45.5), ..Default::default() };
        assert_eq!(store.update_doctor("doc", &changed).await.unwrap(), 1);
        assert_eq!(store.update_doctor("nobody", &changed).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_many_and_update_many_by_filter() {
        let store = InMemoryStore::new();
        let (date, time) = slot();
        let later = NaiveTime::from_hms_opt(11, 0, 0).unwrap();

        store.insert(appointment("d1", "p1", date, time)).await.unwrap();
        store.insert(appointment("d1", "p2", date, later)).await.unwrap();
        store.insert(appointment("d2", "p1", date, time)).await.unwrap();

        let patch = AppointmentPatch { appointment_cost: Some(80.0) };
        let repriced = store.update_many(&AppointmentFilter::for_doctor("d1"), &patch).await.unwrap();
        assert_eq!(repriced, 2);

        let removed = store.delete_many(&AppointmentFilter::for_patient("p1")).await.unwrap();
        assert_eq!(removed, 2);

        let remaining = store.find(&AppointmentFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].patient_username, "p2");
        assert_eq!(remaining[0].appointment_cost, 80.0);
    }

    #[tokio::test]
    async fn test_delete_one_reports_count() {
        let store = InMemoryStore::new();
        let (date, time) = slot();
        let id = store.insert(appointment("d1", "p1", date, time)).await.unwrap();

        assert_eq!(store.delete_one(id).await.unwrap(), 1);
        assert_eq!(store.delete_one(id).await.unwrap(), 0);
        assert!(store.find_by_id(id).await.unwrap().is_none());
    }
}
