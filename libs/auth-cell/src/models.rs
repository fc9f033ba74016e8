use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::auth::Role;
use shared_models::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub home: &'static str,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("Default admin could not be created: {0}")]
    AdminSeed(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidCredentials => AppError::Auth(message),
            AuthError::AdminSeed(_) | AuthError::Token(_) => AppError::Internal(message),
            AuthError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
