use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::jwt::{validate_token, TokenError};

pub const NOT_AUTHORIZED: &str = "Not Authorized, Login again";
pub const SESSION_EXPIRED: &str = "Session expired, please login again";
pub const INVALID_TOKEN: &str = "Invalid token, please login again";

/// Find the session token for `role`: its cookie first, then a bearer
/// header, then the legacy `token` header used by the patient portal.
pub fn read_token(headers: &HeaderMap, role: Role) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(role.cookie_name()) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get("token")
        .and_then(|value| value.to_str().ok())
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub fn authenticate(headers: &HeaderMap, role: Role, config: &AppConfig) -> Result<User, AppError> {
    let token = read_token(headers, role).ok_or_else(|| AppError::Auth(NOT_AUTHORIZED.to_string()))?;

    let user = validate_token(&token, &config.jwt_secret).map_err(|e| match e {
        TokenError::Expired => AppError::Auth(SESSION_EXPIRED.to_string()),
        _ => AppError::Auth(INVALID_TOKEN.to_string()),
    })?;

    if user.role != role {
        return Err(AppError::Auth(NOT_AUTHORIZED.to_string()));
    }

    // Admin sessions stay bound to the configured admin account.
    if role == Role::Admin
        && (config.admin_email.is_empty() || user.email.as_deref() != Some(config.admin_email.as_str()))
    {
        return Err(AppError::Auth(NOT_AUTHORIZED.to_string()));
    }

    Ok(user)
}

async fn require_role(
    config: &AppConfig,
    role: Role,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(request.headers(), role, config)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&config, Role::Admin, request, next).await
}

pub async fn require_doctor(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&config, Role::Doctor, request, next).await
}

pub async fn require_user(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&config, Role::User, request, next).await
}
