use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{require_admin, require_user};
use shared_utils::form::MAX_UPLOAD_BYTES;

use crate::handlers;

/// Patient records routes mounted under `/api/admin`.
pub fn admin_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/all-patients", get(handlers::all_patients))
        .route(
            "/patient/{patient_id}",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(config.clone(), require_admin))
        .with_state(config)
}

/// Profile routes mounted under `/api/user`.
pub fn user_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/get-profile", get(handlers::get_profile))
        .route(
            "/update-profile",
            post(handlers::update_profile).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(middleware::from_fn_with_state(config.clone(), require_user))
        .with_state(config)
}
