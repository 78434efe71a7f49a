use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_utils::form::UploadedImage;
use shared_utils::password::hash_password;
use shared_utils::validation::{is_valid_email, MIN_STAFF_PASSWORD_LEN};

use crate::models::{Doctor, DoctorError, NewDoctor, Released, SlotsBooked, UpdateDoctorProfileRequest};
use crate::services::slots::SlotKey;

/// Conditional writes of a doctor's booked slots before giving up on a busy row.
pub const MAX_SLOT_WRITE_ATTEMPTS: usize = 3;

const DOCTOR_IMAGE_FOLDER: &str = "doctors";

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_doctor(&self, request: NewDoctor, image: UploadedImage) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for: {}", request.email);

        if !is_valid_email(&request.email) {
            return Err(DoctorError::Validation("Please enter a valid email".to_string()));
        }
        if request.password.chars().count() < MIN_STAFF_PASSWORD_LEN {
            return Err(DoctorError::Validation("Please enter a strong password".to_string()));
        }
        if !request.fees.is_finite() || request.fees < 0.0 {
            return Err(DoctorError::Validation("Fees must be a non-negative amount".to_string()));
        }

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(DoctorError::EmailTaken);
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| DoctorError::Validation(format!("Unable to hash password: {}", e)))?;

        let image_url = self
            .supabase
            .upload_image(DOCTOR_IMAGE_FOLDER, image.data, &image.content_type)
            .await
            .map_err(|e| DoctorError::Upload(e.to_string()))?;

        let doctor_data = json!({
            "name": request.name,
            "email": request.email.to_lowercase(),
            "password_hash": password_hash,
            "image": image_url,
            "speciality": request.speciality,
            "degree": request.degree,
            "experience": request.experience,
            "about": request.about,
            "available": true,
            "fees": request.fees,
            "address": request.address,
            "slots_booked": {},
            "slots_version": 0,
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Doctor> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/doctors", Some(doctor_data), Some(return_representation()))
            .await?;

        let doctor = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Database(anyhow::anyhow!("Failed to create doctor profile")))?;

        info!("Doctor {} added with ID {}", doctor.email, doctor.id);
        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", urlencoding::encode(doctor_id));
        let result: Vec<Doctor> = self.supabase.request(Method::GET, &path, None).await?;

        result.into_iter().next().ok_or(DoctorError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Doctor>, DoctorError> {
        let path = format!(
            "/rest/v1/doctors?email=eq.{}",
            urlencoding::encode(&email.trim().to_lowercase())
        );
        let result: Vec<Doctor> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        let doctors: Vec<Doctor> = self
            .supabase
            .request(Method::GET, "/rest/v1/doctors?order=created_at.asc", None)
            .await?;

        debug!("Loaded {} doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn toggle_availability(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;
        let updated = self.patch_doctor(doctor_id, json!({ "available": !doctor.available })).await?;

        info!("Doctor {} availability set to {}", doctor_id, updated.available);
        Ok(updated)
    }

    pub async fn update_profile(
        &self,
        doctor_id: &str,
        request: UpdateDoctorProfileRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let mut update_data = Map::new();

        if let Some(fees) = request.fees {
            if !fees.is_finite() || fees < 0.0 {
                return Err(DoctorError::Validation("Fees must be a non-negative amount".to_string()));
            }
            update_data.insert("fees".to_string(), json!(fees));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(available) = request.available {
            update_data.insert("available".to_string(), json!(available));
        }

        if update_data.is_empty() {
            return self.get_doctor(doctor_id).await;
        }

        self.patch_doctor(doctor_id, Value::Object(update_data)).await
    }

    /// Mark `slot` booked on the doctor's calendar.
    ///
    /// The write only lands if `slots_version` is unchanged since the read; a
    /// concurrent booking forces a re-read so the slot is checked again.
    pub async fn reserve_slot(&self, doctor_id: &str, slot: &SlotKey) -> Result<Doctor, DoctorError> {
        for attempt in 1..=MAX_SLOT_WRITE_ATTEMPTS {
            let doctor = self.get_doctor(doctor_id).await?;
            if !doctor.available {
                return Err(DoctorError::NotAvailable);
            }

            let mut slots = doctor.slots_booked.clone();
            if !slots.book(&slot.date, &slot.time) {
                return Err(DoctorError::SlotTaken);
            }

            if let Some(updated) = self.write_slots(&doctor, &slots).await? {
                info!("Reserved {} {} for doctor {}", slot.date, slot.time, doctor_id);
                return Ok(updated);
            }

            warn!(
                "Slot write for doctor {} lost a concurrent update (attempt {}/{})",
                doctor_id, attempt, MAX_SLOT_WRITE_ATTEMPTS
            );
        }

        Err(DoctorError::Contended)
    }

    /// Remove `time` from `date` on the doctor's calendar, leaving other times alone.
    pub async fn release_slot(&self, doctor_id: &str, date: &str, time: &str) -> Result<Released, DoctorError> {
        for attempt in 1..=MAX_SLOT_WRITE_ATTEMPTS {
            let doctor = self.get_doctor(doctor_id).await?;

            let mut slots = doctor.slots_booked.clone();
            let outcome = slots.release(date, time);
            if outcome != Released::Released {
                warn!("Release of {} {} for doctor {}: {:?}", date, time, doctor_id, outcome);
                return Ok(outcome);
            }

            if self.write_slots(&doctor, &slots).await?.is_some() {
                info!("Released {} {} for doctor {}", date, time, doctor_id);
                return Ok(outcome);
            }

            warn!(
                "Slot release for doctor {} lost a concurrent update (attempt {}/{})",
                doctor_id, attempt, MAX_SLOT_WRITE_ATTEMPTS
            );
        }

        Err(DoctorError::Contended)
    }

    /// Compare-and-set on `slots_version`; `None` when another writer got there first.
    async fn write_slots(&self, doctor: &Doctor, slots: &SlotsBooked) -> Result<Option<Doctor>, DoctorError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&slots_version=eq.{}",
            urlencoding::encode(&doctor.id),
            doctor.slots_version
        );
        let body = json!({
            "slots_booked": slots,
            "slots_version": doctor.slots_version + 1
        });

        let result: Vec<Doctor> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(body), Some(return_representation()))
            .await?;

        Ok(result.into_iter().next())
    }

    async fn patch_doctor(&self, doctor_id: &str, body: Value) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", urlencoding::encode(doctor_id));
        let result: Vec<Doctor> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(body), Some(return_representation()))
            .await?;

        result.into_iter().next().ok_or(DoctorError::NotFound)
    }
}
