use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::models::{Address, DoctorError};
use shared_models::error::AppError;

/// Flat charge added to a bill when an x-ray was taken.
pub const XRAY_CHARGE: f64 = 100.0;

/// Charges and payments on a patient's account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    pub fees: f64,
    pub xray: bool,
    pub cost_of_treatment: f64,
    pub medicine: f64,
    pub received: f64,
}

impl Billing {
    pub fn total(&self) -> f64 {
        self.fees + self.cost_of_treatment + self.medicine + if self.xray { XRAY_CHARGE } else { 0.0 }
    }

    pub fn balance_due(&self) -> f64 {
        (self.total() - self.received).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub assigned_doctor: Option<String>,
    #[serde(default)]
    pub appointment_date: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub fees: f64,
    #[serde(default)]
    pub xray: bool,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub cost_of_treatment: f64,
    #[serde(default)]
    pub medicine: f64,
    #[serde(default)]
    pub received: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub balance_due: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn billing(&self) -> Billing {
        Billing {
            fees: self.fees,
            xray: self.xray,
            cost_of_treatment: self.cost_of_treatment,
            medicine: self.medicine,
            received: self.received,
        }
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
            phone: self.phone.clone(),
            dob: self.dob.clone(),
            gender: self.gender.clone(),
            address: self.address.clone(),
            medical_history: self.medical_history.clone(),
            total: self.total,
        }
    }
}

/// Copy of the patient stored on each appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub total: f64,
}

/// Front-desk registration of a patient.
#[derive(Debug, Clone, Default)]
pub struct PatientIntake {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub gender: String,
    pub address: Address,
    pub medical_history: String,
    pub assigned_doctor: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub treatment: String,
    pub billing: Billing,
}

/// Partial update from the admin panel; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub address: Option<Address>,
    pub assigned_doctor: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub medical_history: Option<String>,
    pub treatment: Option<String>,
    pub fees: Option<f64>,
    pub cost_of_treatment: Option<f64>,
    pub medicine: Option<f64>,
    pub xray: Option<bool>,
    pub received: Option<f64>,
}

impl PatientUpdate {
    /// Billing after applying this update on top of `current`.
    pub fn merged_billing(&self, current: &Billing) -> Billing {
        Billing {
            fees: self.fees.unwrap_or(current.fees),
            xray: self.xray.unwrap_or(current.xray),
            cost_of_treatment: self.cost_of_treatment.unwrap_or(current.cost_of_treatment),
            medicine: self.medicine.unwrap_or(current.medicine),
            received: self.received.unwrap_or(current.received),
        }
    }
}

/// Self-service profile edit from the patient portal.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
    pub address: Address,
    pub dob: String,
    pub gender: String,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Enter a valid email")]
    InvalidEmail,
    #[error("Please enter a strong password")]
    WeakPassword,
    #[error("Selected doctor not found")]
    DoctorNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Image upload failed: {0}")]
    Upload(String),
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<DoctorError> for PatientError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => PatientError::DoctorNotFound,
            other => PatientError::Database(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::EmailTaken => AppError::Conflict(err.to_string()),
            PatientError::InvalidEmail | PatientError::WeakPassword | PatientError::DoctorNotFound => {
                AppError::ValidationError(err.to_string())
            }
            PatientError::Validation(msg) => AppError::ValidationError(msg),
            PatientError::Upload(msg) => AppError::ExternalService(msg),
            PatientError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_includes_xray_charge() {
        let billing = Billing {
            fees: 500.0,
            xray: true,
            cost_of_treatment: 1200.0,
            medicine: 150.0,
            received: 0.0,
        };
        assert_eq!(billing.total(), 1950.0);

        let without = Billing { xray: false, ..billing };
        assert_eq!(without.total(), 1850.0);
    }

    #[test]
    fn test_balance_due_never_negative() {
        let billing = Billing {
            fees: 300.0,
            received: 250.0,
            ..Default::default()
        };
        assert_eq!(billing.balance_due(), 50.0);

        let overpaid = Billing { received: 1000.0, ..billing };
        assert_eq!(overpaid.balance_due(), 0.0);
    }

    #[test]
    fn test_merged_billing_keeps_unchanged_fields() {
        let current = Billing {
            fees: 300.0,
            xray: true,
            cost_of_treatment: 100.0,
            medicine: 20.0,
            received: 50.0,
        };
        let update = PatientUpdate {
            medicine: Some(80.0),
            xray: Some(false),
            ..Default::default()
        };

        let merged = update.merged_billing(&current);
        assert_eq!(merged.fees, 300.0);
        assert_eq!(merged.medicine, 80.0);
        assert!(!merged.xray);
        assert_eq!(merged.total(), 480.0);
        assert_eq!(merged.balance_due(), 430.0);
    }
}
