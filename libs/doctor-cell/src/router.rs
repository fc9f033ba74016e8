use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, put},
    middleware,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        // Admin account management
        .route("/", get(handlers::list_doctors).post(handlers::create_doctor))
        .route("/{username}", delete(handlers::delete_doctor))
        .route("/{username}/password", put(handlers::change_doctor_password))

        // Doctor self-service
        .route("/me/password", put(handlers::change_own_password))
        .route("/me/cost", put(handlers::change_own_cost))

        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
