use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::cookies::{clear_session, session_cookie};

use crate::models::{LoginRequest, RegisterRequest};
use crate::services::AuthService;

// ==============================================================================
// ADMIN
// ==============================================================================

#[axum::debug_handler]
pub async fn admin_login(
    State(config): State<Arc<AppConfig>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let session = AuthService::new(&config).admin_login(&request.email, &request.password)?;
    let jar = jar.add(session_cookie(Role::Admin, session.token, config.cookie_secure));

    Ok((jar, Json(json!({
        "success": true,
        "message": "Admin logged in"
    }))))
}

pub async fn admin_logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (clear_session(jar, Role::Admin), Json(json!({
        "success": true,
        "message": "Logged out"
    })))
}

// ==============================================================================
// DOCTOR
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_login(
    State(config): State<Arc<AppConfig>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let session = AuthService::new(&config)
        .doctor_login(&request.email, &request.password)
        .await?;

    // A browser holds one staff session at a time.
    let jar = clear_session(jar, Role::Admin)
        .add(session_cookie(Role::Doctor, session.token, config.cookie_secure));

    Ok((jar, Json(json!({
        "success": true,
        "message": "Doctor logged in"
    }))))
}

pub async fn doctor_logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (clear_session(jar, Role::Doctor), Json(json!({
        "success": true,
        "message": "Logged out"
    })))
}

// ==============================================================================
// PATIENT PORTAL
// ==============================================================================

#[axum::debug_handler]
pub async fn register_user(
    State(config): State<Arc<AppConfig>>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let session = AuthService::new(&config)
        .register_user(&request.name, &request.email, &request.password)
        .await?;
    debug!("Issued session for new user {}", session.subject);

    let jar = jar.add(session_cookie(Role::User, session.token.clone(), config.cookie_secure));

    Ok((jar, Json(json!({
        "success": true,
        "token": session.token
    }))))
}

#[axum::debug_handler]
pub async fn user_login(
    State(config): State<Arc<AppConfig>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let session = AuthService::new(&config)
        .user_login(&request.email, &request.password)
        .await?;

    let jar = jar.add(session_cookie(Role::User, session.token.clone(), config.cookie_secure));

    Ok((jar, Json(json!({
        "success": true,
        "token": session.token
    }))))
}

pub async fn user_logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (clear_session(jar, Role::User), Json(json!({
        "success": true,
        "message": "Logged out"
    })))
}
