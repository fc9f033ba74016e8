use std::sync::Arc;
use axum::{middleware, routing::{delete, get, post}, Router};
use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_patient_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(signup));

    let admin_routes = Router::new()
        .route("/", get(list_patients))
        .route("/{username}", delete(delete_patient))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
