use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{require_admin, require_doctor};
use shared_utils::form::MAX_UPLOAD_BYTES;

use crate::handlers;

/// Routes mounted under `/api/doctor`.
pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/list", get(handlers::list_doctors))
        .route("/{doc_id}/slots", get(handlers::get_doctor_slots));

    let protected_routes = Router::new()
        .route("/profile", get(handlers::doctor_profile))
        .route("/update-profile", post(handlers::update_doctor_profile))
        .route("/change-availability", post(handlers::doctor_change_availability))
        .layer(middleware::from_fn_with_state(state.clone(), require_doctor));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Doctor management routes mounted under `/api/admin`.
pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/add-doctor",
            post(handlers::add_doctor).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/all-doctors", get(handlers::all_doctors))
        .route("/change-availability", post(handlers::admin_change_availability))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
