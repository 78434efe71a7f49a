use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/login", post(handlers::admin_login))
        .route("/logout", post(handlers::admin_logout))
        .with_state(state)
}

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/login", post(handlers::doctor_login))
        .route("/logout", post(handlers::doctor_logout))
        .with_state(state)
}

pub fn user_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/register", post(handlers::register_user))
        .route("/login", post(handlers::user_login))
        .route("/logout", post(handlers::user_logout))
        .with_state(state)
}
