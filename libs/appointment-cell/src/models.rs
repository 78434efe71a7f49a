use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::models::{DoctorError, DoctorSnapshot};
use patient_cell::models::{Patient, PatientError, UserSnapshot};
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    pub doc_id: String,
    pub slot_date: String,
    pub slot_time: String,
    pub user_data: UserSnapshot,
    pub doc_data: DoctorSnapshot,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub payment: bool,
    #[serde(default)]
    pub is_completed: bool,
}

impl Appointment {
    /// Counts towards a doctor's earnings.
    pub fn is_settled(&self) -> bool {
        self.is_completed || self.payment
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    #[serde(alias = "doc_id")]
    pub doc_id: String,
    #[serde(alias = "slot_date")]
    pub slot_date: String,
    #[serde(alias = "slot_time")]
    pub slot_time: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentActionRequest {
    #[serde(alias = "appointment_id")]
    pub appointment_id: String,
}

// ==============================================================================
// DASHBOARD MODELS
// ==============================================================================

pub const LATEST_APPOINTMENTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub earnings: f64,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub doctors: usize,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<Appointment>,
}

/// Outcome of a front-desk registration.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeOutcome {
    pub patient: Patient,
    pub default_password: String,
    pub appointment: Option<Appointment>,
    /// Why the requested booking could not be made; the patient is kept regardless.
    pub appointment_error: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Unauthorized action")]
    Unauthorized,

    #[error("Appointment already cancelled")]
    AlreadyCancelled,

    #[error("Appointment already completed")]
    AlreadyCompleted,

    #[error("Cancelled appointments cannot be completed")]
    CompletingCancelled,

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::Unauthorized => AppError::Forbidden(err.to_string()),
            AppointmentError::AlreadyCancelled
            | AppointmentError::AlreadyCompleted
            | AppointmentError::CompletingCancelled => AppError::Conflict(err.to_string()),
            AppointmentError::Doctor(e) => e.into(),
            AppointmentError::Patient(e) => e.into(),
            AppointmentError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_request_accepts_both_casings() {
        let camel: BookAppointmentRequest =
            serde_json::from_str(r#"{"docId":"d1","slotDate":"15-06-2025","slotTime":"10:00 AM"}"#).unwrap();
        let snake: BookAppointmentRequest =
            serde_json::from_str(r#"{"doc_id":"d1","slot_date":"15-06-2025","slot_time":"10:00 AM"}"#).unwrap();

        assert_eq!(camel.doc_id, snake.doc_id);
        assert_eq!(camel.slot_time, "10:00 AM");
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(AppError::from(AppointmentError::Unauthorized).status().as_u16(), 403);
        assert_eq!(AppError::from(AppointmentError::AlreadyCancelled).status().as_u16(), 409);
        assert_eq!(
            AppError::from(AppointmentError::Doctor(DoctorError::SlotTaken)).message(),
            "Slot not available"
        );
    }
}
