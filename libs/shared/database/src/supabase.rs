use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Admin, Appointment, Doctor, Identity, Patient};

use crate::store::{
    AppointmentFilter, AppointmentPatch, AppointmentStore, DirectoryStore, DoctorFilter,
    DoctorPatch, PatientFilter, StoreError, StoreResult,
};

const ADMINS: &str = "/rest/v1/admins";
const DOCTORS: &str = "/rest/v1/doctors";
const PATIENTS: &str = "/rest/v1/patients";
const APPOINTMENTS: &str = "/rest/v1/appointments";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_api_key.clone(),
        }
    }

    fn get_headers(&self) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| StoreError::Configuration(format!("invalid API key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| StoreError::Configuration(format!("invalid API key: {}", e)))?;

        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                409 => {
                    debug!("Unique constraint rejected write: {}", error_text);
                    StoreError::Conflict(error_text)
                }
                code => {
                    error!("API error ({}): {}", status, error_text);
                    StoreError::Backend { status: code, message: error_text }
                }
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Writes that should echo the affected rows back, so callers can count them.
    async fn request_representation(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> StoreResult<Vec<Value>> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(method, path, body, Some(headers)).await
    }
}

// ==============================================================================
// POSTGREST QUERY BUILDING
// ==============================================================================

fn eq(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

fn not_in(column: &str, values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{}=not.in.({})", column, urlencoding::encode(&quoted.join(",")))
}

fn with_query(table: &str, parts: &[String]) -> String {
    if parts.is_empty() {
        table.to_string()
    } else {
        format!("{}?{}", table, parts.join("&"))
    }
}

fn doctor_query(filter: &DoctorFilter) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(username) = &filter.username {
        parts.push(eq("username", username));
    }
    if let Some(email) = &filter.email {
        parts.push(eq("email", email));
    }
    if let Some(specialty) = filter.specialty {
        parts.push(eq("specialty", specialty.as_str()));
    }
    if !filter.exclude_usernames.is_empty() {
        parts.push(not_in("username", &filter.exclude_usernames));
    }
    parts
}

fn patient_query(filter: &PatientFilter) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(username) = &filter.username {
        parts.push(eq("username", username));
    }
    if let Some(email) = &filter.email {
        parts.push(eq("email", email));
    }
    parts
}

fn appointment_query(filter: &AppointmentFilter) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(id) = filter.id {
        parts.push(eq("id", &id.to_string()));
    }
    if let Some(doctor) = &filter.doctor_username {
        parts.push(eq("doctor_username", doctor));
    }
    if let Some(patient) = &filter.patient_username {
        parts.push(eq("patient_username", patient));
    }
    if let Some(date) = filter.date {
        parts.push(eq("date", &date.format("%Y-%m-%d").to_string()));
    }
    if let Some(time) = filter.time {
        parts.push(eq("time", &time.format("%H:%M:%S").to_string()));
    }
    if let Some(from) = filter.from_date {
        parts.push(format!("date=gte.{}", from.format("%Y-%m-%d")));
    }
    parts
}

fn parse_rows<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)
}

/// [`DirectoryStore`] and [`AppointmentStore`] over Supabase's PostgREST API.
///
/// Expects `admins`, `doctors`, `patients` and `appointments` tables whose
/// columns mirror the record fields, with unique indexes on usernames,
/// emails and `(doctor_username, date, time)`.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, parts: Vec<String>) -> StoreResult<Vec<T>> {
        let path = with_query(table, &parts);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        parse_rows(rows)
    }

    async fn select_first<T: DeserializeOwned>(
        &self,
        table: &str,
        mut parts: Vec<String>,
    ) -> StoreResult<Option<T>> {
        parts.push("limit=1".to_string());
        Ok(self.select(table, parts).await?.into_iter().next())
    }

    async fn insert_row<T: Serialize>(&self, table: &str, record: &T) -> StoreResult<()> {
        let body = serde_json::to_value(record)?;
        let rows = self.supabase.request_representation(Method::POST, table, Some(body)).await?;

        if rows.is_empty() {
            return Err(StoreError::Backend {
                status: 201,
                message: format!("insert into {} returned no rows", table),
            });
        }
        Ok(())
    }

    async fn delete_rows(&self, table: &str, parts: Vec<String>) -> StoreResult<u64> {
        let path = with_query(table, &parts);
        let rows = self.supabase.request_representation(Method::DELETE, &path, None).await?;
        Ok(rows.len() as u64)
    }

    async fn patch_rows(&self, table: &str, parts: Vec<String>, body: Map<String, Value>) -> StoreResult<u64> {
        let path = with_query(table, &parts);
        let rows = self
            .supabase
            .request_representation(Method::PATCH, &path, Some(Value::Object(body)))
            .await?;
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl DirectoryStore for SupabaseStore {
    async fn find_identity(&self, username: &str) -> StoreResult<Option<Identity>> {
        if let Some(admin) = self.find_admin(username).await? {
            return Ok(Some(Identity::from(&admin)));
        }
        if let Some(doctor) = self.find_doctor(&DoctorFilter::by_username(username)).await? {
            return Ok(Some(Identity::from(&doctor)));
        }
        let patient = self.find_patient(&PatientFilter::by_username(username)).await?;
        Ok(patient.as_ref().map(Identity::from))
    }

    async fn find_admin(&self, username: &str) -> StoreResult<Option<Admin>> {
        self.select_first(ADMINS, vec![eq("username", username)]).await
    }

    async fn insert_admin(&self, admin: Admin) -> StoreResult<Uuid> {
        self.insert_row(ADMINS, &admin).await?;
        Ok(admin.id)
    }

    async fn find_doctor(&self, filter: &DoctorFilter) -> StoreResult<Option<Doctor>> {
        let mut parts = doctor_query(filter);
        parts.push("order=created_at.asc,id.asc".to_string());
        self.select_first(DOCTORS, parts).await
    }

    async fn list_doctors(&self, filter: &DoctorFilter) -> StoreResult<Vec<Doctor>> {
        let mut parts = doctor_query(filter);
        parts.push("order=created_at.asc,id.asc".to_string());
        self.select(DOCTORS, parts).await
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Uuid> {
        self.insert_row(DOCTORS, &doctor).await?;
        Ok(doctor.id)
    }

    async fn update_doctor(&self, username: &str, patch: &DoctorPatch) -> StoreResult<u64> {
        if patch.is_empty() {
            return Ok(0);
        }

        let mut body = Map::new();
        if let Some(password) = &patch.password {
            body.insert("password".to_string(), json!(password));
        }
        if let Some(cost) = patch.appointment_cost {
            body.insert("appointment_cost".to_string(), json!(cost));
        }

        self.patch_rows(DOCTORS, vec![eq("username", username)], body).await
    }

    async fn delete_doctor(&self, username: &str) -> StoreResult<u64> {
        self.delete_rows(DOCTORS, vec![eq("username", username)]).await
    }

    async fn find_patient(&self, filter: &PatientFilter) -> StoreResult<Option<Patient>> {
        self.select_first(PATIENTS, patient_query(filter)).await
    }

    async fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        self.select(PATIENTS, vec!["order=created_at.asc,id.asc".to_string()]).await
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Uuid> {
        self.insert_row(PATIENTS, &patient).await?;
        Ok(patient.id)
    }

    async fn delete_patient(&self, username: &str) -> StoreResult<u64> {
        self.delete_rows(PATIENTS, vec![eq("username", username)]).await
    }
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn find(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let mut parts = appointment_query(filter);
        parts.push("order=date.asc,time.asc".to_string());
        self.select(APPOINTMENTS, parts).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_first(APPOINTMENTS, vec![eq("id", &id.to_string())]).await
    }

    async fn insert(&self, appointment: Appointment) -> StoreResult<Uuid> {
        self.insert_row(APPOINTMENTS, &appointment).await?;
        Ok(appointment.id)
    }

    async fn delete_one(&self, id: Uuid) -> StoreResult<u64> {
        self.delete_rows(APPOINTMENTS, vec![eq("id", &id.to_string())]).await
    }

    async fn delete_many(&self, filter: &AppointmentFilter) -> StoreResult<u64> {
        self.delete_rows(APPOINTMENTS, appointment_query(filter)).await
    }

    async fn update_many(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
    ) -> StoreResult<u64> {
        let Some(cost) = patch.appointment_cost else {
            return Ok(0);
        };

        let mut body = Map::new();
        body.insert("appointment_cost".to_string(), json!(cost));
        self.patch_rows(APPOINTMENTS, appointment_query(filter), body).await
    }
}
