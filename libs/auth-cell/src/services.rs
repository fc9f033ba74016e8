use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{AppState, DirectoryStore, StoreError};
use shared_models::Admin;
use shared_utils::jwt::issue_token;

use crate::models::{AuthError, LoginRequest, LoginResponse};

pub struct AuthService {
    config: Arc<AppConfig>,
    directory: Arc<dyn DirectoryStore>,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: Arc::clone(&state.config),
            directory: Arc::clone(&state.directory),
        }
    }

    /// Resolves the username to exactly one role and issues a token for it.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let identity = self
            .directory
            .find_identity(request.username.trim())
            .await?
            .filter(|identity| identity.password_matches(&request.password))
            .ok_or_else(|| {
                debug!("Login rejected");
                AuthError::InvalidCredentials
            })?;

        let token = issue_token(
            &identity.username,
            identity.role,
            &self.config.jwt_secret,
            self.config.token_ttl_hours,
        )
        .map_err(AuthError::Token)?;

        info!("{} logged in as {}", identity.username, identity.role);

        Ok(LoginResponse {
            token,
            username: identity.username,
            role: identity.role,
            home: identity.role.home_path(),
        })
    }

    /// Creates the configured admin account unless it already exists.
    /// Returns whether an account was created.
    pub async fn ensure_default_admin(&self) -> Result<bool, AuthError> {
        let username = self.config.default_admin_username.as_str();

        if self.directory.find_admin(username).await?.is_some() {
            debug!("Default admin {} already present", username);
            return Ok(false);
        }

        let admin = Admin {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: self.config.default_admin_password.clone(),
        };

        match self.directory.insert_admin(admin).await {
            Ok(_) => {
                info!("Default admin {} created", username);
                Ok(true)
            }
            Err(StoreError::Conflict(reason)) => {
                warn!("Default admin username {} is taken: {}", username, reason);
                Err(AuthError::AdminSeed(reason))
            }
            Err(e) => Err(e.into()),
        }
    }
}
