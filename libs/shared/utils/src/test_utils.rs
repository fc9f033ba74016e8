use chrono::{Duration, Local, NaiveDate, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::{Doctor, Patient, Specialty};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_api_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_api_key: self.supabase_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

}

pub struct TestUser {
    pub username: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            role,
        }
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            username: self.username.clone(),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        issue_token(&user.username, user.role, secret, exp_hours.unwrap_or(24))
            .expect("test secret must not be empty")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, secret: &str) -> String {
        format!("Bearer {}", Self::create_test_token(user, secret, Some(24)))
    }
}

/// Record builders with unique emails, for seeding stores in tests.
pub struct Fixtures;

impl Fixtures {
    pub fn doctor(username: &str, specialty: Specialty, appointment_cost: f64) -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            name: format!("{}-name", username),
            surname: format!("{}-surname", username),
            email: format!("{}@clinic.test", username),
            username: username.to_string(),
            password: format!("{}-password", username),
            specialty,
            appointment_cost,
            created_at: Utc::now(),
        }
    }

    pub fn patient(username: &str) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            name: format!("{}-name", username),
            surname: format!("{}-surname", username),
            email: format!("{}@mail.test", username),
            username: username.to_string(),
            password: format!("{}-password", username),
            national_health_id: "01019012345".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid fixture date"),
            created_at: Utc::now(),
        }
    }

    /// A date `days` away from today, formatted the way booking forms send it.
    pub fn date_from_today(days: i64) -> String {
        (Local::now().date_naive() + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }
}
