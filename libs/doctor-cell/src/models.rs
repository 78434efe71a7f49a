use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

use crate::services::slots::SlotError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

/// Booked times per slot date (`DD-MM-YYYY` -> `["10:00 AM", ...]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotsBooked(BTreeMap<String, Vec<String>>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    Released,
    NotBooked,
    DateMissing,
}

impl SlotsBooked {
    pub fn is_booked(&self, date: &str, time: &str) -> bool {
        self.0
            .get(date)
            .is_some_and(|times| times.iter().any(|t| t == time))
    }

    pub fn times(&self, date: &str) -> &[String] {
        self.0.get(date).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `false` when the time was already taken.
    pub fn book(&mut self, date: &str, time: &str) -> bool {
        let times = self.0.entry(date.to_string()).or_default();
        if times.iter().any(|t| t == time) {
            return false;
        }
        times.push(time.to_string());
        true
    }

    /// Removes exactly `time` from `date`; a date left without times is dropped.
    pub fn release(&mut self, date: &str, time: &str) -> Released {
        let Some(times) = self.0.get_mut(date) else {
            return Released::DateMissing;
        };

        let before = times.len();
        times.retain(|t| t != time);
        let outcome = if times.len() < before {
            Released::Released
        } else {
            Released::NotBooked
        };

        if times.is_empty() {
            self.0.remove(date);
        }
        outcome
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, &[&str]); N]> for SlotsBooked {
    fn from(entries: [(&str, &[&str]); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(date, times)| (date.to_string(), times.iter().map(|t| t.to_string()).collect()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub image: Option<String>,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub available: bool,
    pub fees: f64,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub slots_booked: SlotsBooked,
    #[serde(default)]
    pub slots_version: i64,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn snapshot(&self) -> DoctorSnapshot {
        DoctorSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
            speciality: self.speciality.clone(),
            degree: self.degree.clone(),
            experience: self.experience.clone(),
            fees: self.fees,
            address: self.address.clone(),
        }
    }

    pub fn public_view(&self) -> PublicDoctor {
        PublicDoctor {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            speciality: self.speciality.clone(),
            degree: self.degree.clone(),
            experience: self.experience.clone(),
            about: self.about.clone(),
            available: self.available,
            fees: self.fees,
            address: self.address.clone(),
            slots_booked: self.slots_booked.clone(),
        }
    }
}

/// Copy of the doctor stored on each appointment at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub image: Option<String>,
    #[serde(default)]
    pub speciality: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub fees: f64,
    #[serde(default)]
    pub address: Address,
}

/// What the patient portal may see of a doctor.
#[derive(Debug, Clone, Serialize)]
pub struct PublicDoctor {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub available: bool,
    pub fees: f64,
    pub address: Address,
    pub slots_booked: SlotsBooked,
}

#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub name: String,
    pub email: String,
    pub password: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: f64,
    pub address: Address,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    pub fees: Option<f64>,
    pub address: Option<Address>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityRequest {
    #[serde(alias = "doc_id")]
    pub doc_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: Option<String>,
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,
    #[error("Doctor not available")]
    NotAvailable,
    #[error("Slot not available")]
    SlotTaken,
    #[error("Email already in use")]
    EmailTaken,
    #[error("Slot is being booked by someone else, please try again")]
    Contended,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("Image upload failed: {0}")]
    Upload(String),
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::NotAvailable | DoctorError::SlotTaken | DoctorError::EmailTaken => {
                AppError::Conflict(err.to_string())
            }
            DoctorError::Contended => AppError::Conflict(err.to_string()),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::Slot(e) => AppError::ValidationError(e.to_string()),
            DoctorError::Upload(msg) => AppError::ExternalService(msg),
            DoctorError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_is_idempotent_per_time() {
        let mut slots = SlotsBooked::default();
        assert!(slots.book("15-06-2025", "10:00 AM"));
        assert!(!slots.book("15-06-2025", "10:00 AM"));
        assert!(slots.book("15-06-2025", "10:30 AM"));
        assert_eq!(slots.times("15-06-2025"), ["10:00 AM", "10:30 AM"]);
    }

    #[test]
    fn test_release_leaves_other_times() {
        let mut slots = SlotsBooked::from([("15-06-2025", &["10:00 AM", "11:00 AM"][..])]);

        assert_eq!(slots.release("15-06-2025", "10:00 AM"), Released::Released);
        assert!(!slots.is_booked("15-06-2025", "10:00 AM"));
        assert!(slots.is_booked("15-06-2025", "11:00 AM"));

        assert_eq!(slots.release("15-06-2025", "10:00 AM"), Released::NotBooked);
        assert_eq!(slots.release("16-06-2025", "10:00 AM"), Released::DateMissing);
    }

    #[test]
    fn test_release_drops_empty_date() {
        let mut slots = SlotsBooked::from([("15-06-2025", &["10:00 AM"][..])]);
        slots.release("15-06-2025", "10:00 AM");
        assert!(slots.is_empty());
    }

    #[test]
    fn test_slots_booked_serializes_as_map() {
        let slots = SlotsBooked::from([("15-06-2025", &["10:00 AM"][..])]);
        let value = serde_json::to_value(&slots).unwrap();
        assert_eq!(value, serde_json::json!({ "15-06-2025": ["10:00 AM"] }));
    }

    #[test]
    fn test_doctor_never_serializes_password() {
        let doctor: Doctor = serde_json::from_value(serde_json::json!({
            "id": "d1", "name": "Dr. A", "email": "a@x.com", "password_hash": "secret",
            "image": null, "speciality": "Orthodontist", "degree": "BDS", "experience": "2 Years",
            "about": "", "available": true, "fees": 300.0, "created_at": "2025-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(doctor.password_hash, "secret");
        let value = serde_json::to_value(&doctor).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["slots_booked"], serde_json::json!({}));
    }
}
