use serde::Deserialize;
use thiserror::Error;

use doctor_cell::models::DoctorError;
use patient_cell::models::PatientError;
use shared_models::error::AppError;
use shared_utils::jwt::TokenError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A freshly issued session token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject: String,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Details")]
    MissingDetails,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User does not exist")]
    UserNotFound,

    #[error("Admin login is not configured")]
    AdminDisabled,

    #[error("Unable to issue token: {0}")]
    Token(#[from] TokenError),

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Patient(#[from] PatientError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingDetails => AppError::ValidationError(err.to_string()),
            AuthError::InvalidCredentials | AuthError::UserNotFound | AuthError::AdminDisabled => {
                AppError::Auth(err.to_string())
            }
            AuthError::Token(e) => AppError::Internal(e.to_string()),
            AuthError::Doctor(e) => e.into(),
            AuthError::Patient(e) => e.into(),
        }
    }
}
