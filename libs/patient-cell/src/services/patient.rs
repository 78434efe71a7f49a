use chrono::{Datelike, Utc};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_utils::form::UploadedImage;
use shared_utils::password::{default_patient_password, hash_password};
use shared_utils::validation::{is_strong_password, is_valid_email};

use crate::models::{Patient, PatientError, PatientIntake, PatientUpdate, ProfileUpdate};

const PATIENT_IMAGE_FOLDER: &str = "patients";
const DEFAULT_PHONE: &str = "0000000000";
const NOT_SELECTED: &str = "Not Selected";

pub struct PatientService {
    supabase: SupabaseClient,
    doctors: DoctorService,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
        }
    }

    /// Self sign-up from the patient portal.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Patient, PatientError> {
        let email = email.trim().to_lowercase();
        debug!("Registering patient account for: {}", email);

        if !is_valid_email(&email) {
            return Err(PatientError::InvalidEmail);
        }
        if !is_strong_password(password) {
            return Err(PatientError::WeakPassword);
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(PatientError::EmailTaken);
        }

        let password_hash = hash_password(password)
            .map_err(|e| PatientError::Validation(format!("Unable to hash password: {}", e)))?;

        let patient_data = json!({
            "name": name.trim(),
            "email": email,
            "password_hash": password_hash,
            "image": null,
            "address": { "line1": "", "line2": "" },
            "gender": NOT_SELECTED,
            "dob": NOT_SELECTED,
            "phone": DEFAULT_PHONE,
            "medical_history": "",
            "fees": 0.0,
            "xray": false,
            "treatment": "",
            "cost_of_treatment": 0.0,
            "medicine": 0.0,
            "received": 0.0,
            "total": 0.0,
            "balance_due": 0.0,
            "created_at": Utc::now().to_rfc3339()
        });

        let patient = self.insert(patient_data).await?;
        info!("Patient {} registered with ID {}", patient.email, patient.id);
        Ok(patient)
    }

    /// Front-desk registration. Returns the stored patient and the generated
    /// initial password so staff can hand it over.
    pub async fn create_patient(
        &self,
        intake: PatientIntake,
        image: Option<UploadedImage>,
    ) -> Result<(Patient, String), PatientError> {
        let email = intake.email.trim().to_lowercase();
        debug!("Adding patient from front desk: {}", email);

        if !is_valid_email(&email) {
            return Err(PatientError::InvalidEmail);
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(PatientError::EmailTaken);
        }
        if let Some(doctor_id) = intake.assigned_doctor.as_deref() {
            self.doctors.get_doctor(doctor_id).await?;
        }

        // A failed upload should not lose the registration.
        let image_url = match image {
            Some(image) => match self.upload(image).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Continuing patient intake without image: {}", e);
                    None
                }
            },
            None => None,
        };

        let initial_password = default_patient_password(&intake.name, Utc::now().year());
        let password_hash = hash_password(&initial_password)
            .map_err(|e| PatientError::Validation(format!("Unable to hash password: {}", e)))?;

        let billing = intake.billing;
        let patient_data = json!({
            "name": intake.name,
            "email": email,
            "password_hash": password_hash,
            "image": image_url,
            "address": intake.address,
            "gender": intake.gender,
            "dob": intake.dob,
            "phone": intake.phone,
            "medical_history": intake.medical_history,
            "assigned_doctor": intake.assigned_doctor,
            "appointment_date": intake.appointment_date,
            "appointment_time": intake.appointment_time,
            "fees": billing.fees,
            "xray": billing.xray,
            "treatment": intake.treatment,
            "cost_of_treatment": billing.cost_of_treatment,
            "medicine": billing.medicine,
            "received": billing.received,
            "total": billing.total(),
            "balance_due": billing.balance_due(),
            "created_at": Utc::now().to_rfc3339()
        });

        let patient = self.insert(patient_data).await?;
        info!("Patient {} added by admin with ID {}", patient.email, patient.id);
        Ok((patient, initial_password))
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}", urlencoding::encode(patient_id));
        let result: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, PatientError> {
        let path = format!(
            "/rest/v1/patients?email=eq.{}",
            urlencoding::encode(&email.trim().to_lowercase())
        );
        let result: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    /// All patients, newest first.
    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        let patients: Vec<Patient> = self
            .supabase
            .request(Method::GET, "/rest/v1/patients?order=created_at.desc", None)
            .await?;

        debug!("Loaded {} patients", patients.len());
        Ok(patients)
    }

    /// Admin edit. Totals are always recomputed from the merged charges, and
    /// the new details are copied onto the patient's appointments.
    pub async fn update_patient(
        &self,
        patient_id: &str,
        update: PatientUpdate,
        image: Option<UploadedImage>,
    ) -> Result<Patient, PatientError> {
        let current = self.get_patient(patient_id).await?;
        let mut update_data = Map::new();

        if let Some(email) = update.email.as_deref() {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(PatientError::InvalidEmail);
            }
            if let Some(existing) = self.find_by_email(&email).await? {
                if existing.id != patient_id {
                    return Err(PatientError::EmailTaken);
                }
            }
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(doctor_id) = update.assigned_doctor.as_deref() {
            self.doctors.get_doctor(doctor_id).await?;
            update_data.insert("assigned_doctor".to_string(), json!(doctor_id));
        }

        let text_fields = [
            ("name", &update.name),
            ("phone", &update.phone),
            ("dob", &update.dob),
            ("gender", &update.gender),
            ("appointment_date", &update.appointment_date),
            ("appointment_time", &update.appointment_time),
            ("medical_history", &update.medical_history),
            ("treatment", &update.treatment),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                update_data.insert(column.to_string(), json!(value));
            }
        }
        if let Some(address) = &update.address {
            update_data.insert("address".to_string(), json!(address));
        }

        let billing = update.merged_billing(&current.billing());
        update_data.insert("fees".to_string(), json!(billing.fees));
        update_data.insert("xray".to_string(), json!(billing.xray));
        update_data.insert("cost_of_treatment".to_string(), json!(billing.cost_of_treatment));
        update_data.insert("medicine".to_string(), json!(billing.medicine));
        update_data.insert("received".to_string(), json!(billing.received));
        update_data.insert("total".to_string(), json!(billing.total()));
        update_data.insert("balance_due".to_string(), json!(billing.balance_due()));

        if let Some(image) = image {
            let url = self.upload(image).await?;
            update_data.insert("image".to_string(), json!(url));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated = self.patch_patient(patient_id, Value::Object(update_data)).await?;
        self.refresh_appointment_snapshots(&updated).await?;

        info!("Patient {} updated by admin", patient_id);
        Ok(updated)
    }

    pub async fn update_profile(
        &self,
        patient_id: &str,
        profile: ProfileUpdate,
        image: Option<UploadedImage>,
    ) -> Result<Patient, PatientError> {
        let mut update_data = json!({
            "name": profile.name,
            "phone": profile.phone,
            "address": profile.address,
            "dob": profile.dob,
            "gender": profile.gender,
            "updated_at": Utc::now().to_rfc3339()
        });

        if let Some(image) = image {
            update_data["image"] = json!(self.upload(image).await?);
        }

        self.patch_patient(patient_id, update_data).await
    }

    /// Removes the patient record only; appointments keep their snapshot.
    pub async fn delete_patient(&self, patient_id: &str) -> Result<(), PatientError> {
        self.get_patient(patient_id).await?;

        let path = format!("/rest/v1/patients?id=eq.{}", urlencoding::encode(patient_id));
        self.supabase.execute(Method::DELETE, &path, None).await?;

        info!("Patient {} deleted", patient_id);
        Ok(())
    }

    async fn refresh_appointment_snapshots(&self, patient: &Patient) -> Result<(), PatientError> {
        let path = format!("/rest/v1/appointments?user_id=eq.{}", urlencoding::encode(&patient.id));
        self.supabase
            .execute(Method::PATCH, &path, Some(json!({ "user_data": patient.snapshot() })))
            .await?;
        Ok(())
    }

    async fn upload(&self, image: UploadedImage) -> Result<String, PatientError> {
        self.supabase
            .upload_image(PATIENT_IMAGE_FOLDER, image.data, &image.content_type)
            .await
            .map_err(|e| PatientError::Upload(e.to_string()))
    }

    async fn insert(&self, patient_data: Value) -> Result<Patient, PatientError> {
        let result: Vec<Patient> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/patients", Some(patient_data), Some(return_representation()))
            .await?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Database(anyhow::anyhow!("Failed to create patient")))
    }

    async fn patch_patient(&self, patient_id: &str, body: Value) -> Result<Patient, PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}", urlencoding::encode(patient_id));
        let result: Vec<Patient> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(body), Some(return_representation()))
            .await?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }
}
