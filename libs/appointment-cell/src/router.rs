use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{require_admin, require_doctor, require_user};
use shared_utils::form::MAX_UPLOAD_BYTES;

use crate::handlers;

/// Booking routes mounted under `/api/user`.
pub fn user_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/book-appointment", post(handlers::book_appointment))
        .route("/appointments", get(handlers::user_appointments))
        .route("/cancel-appointment", post(handlers::user_cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), require_user))
        .with_state(state)
}

/// Appointment routes mounted under `/api/doctor`.
pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/appointments", get(handlers::doctor_appointments))
        .route("/complete-appointment", post(handlers::complete_appointment))
        .route("/cancel-appointment", post(handlers::doctor_cancel_appointment))
        .route("/dashboard", get(handlers::doctor_dashboard))
        .layer(middleware::from_fn_with_state(state.clone(), require_doctor))
        .with_state(state)
}

/// Appointment, dashboard and intake routes mounted under `/api/admin`.
pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/appointments", get(handlers::all_appointments))
        .route("/cancel-appointment", post(handlers::admin_cancel_appointment))
        .route("/dashboard", get(handlers::admin_dashboard))
        .route(
            "/add-patient",
            post(handlers::add_patient).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
