use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, Json, State},
    http::Request,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::{extract_bearer_token, AppJson};
use shared_utils::jwt::validate_token;

use crate::models::{LoginRequest, LoginResponse};
use crate::services::AuthService;

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AuthService::new(&state);

    let response = service.login(request).await?;

    Ok(Json(response))
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&request)?;
    let user = validate_token(token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        username: user.username,
        role: user.role,
    }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({
        "username": user.username,
        "role": user.role,
        "home": user.role.home_path()
    }))
}
