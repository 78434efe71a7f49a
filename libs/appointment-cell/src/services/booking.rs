use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, error, info, warn};

use doctor_cell::services::slots::{self, SlotKey};
use doctor_cell::services::DoctorService;
use patient_cell::models::Patient;
use patient_cell::services::PatientService;
use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest};

pub struct BookingService {
    supabase: SupabaseClient,
    doctors: DoctorService,
    patients: PatientService,
    config: AppConfig,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
            patients: PatientService::new(config),
            config: config.clone(),
        }
    }

    /// Book a slot for a signed-in patient.
    pub async fn book(&self, user_id: &str, request: BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        let patient = self.patients.get_patient(user_id).await?;
        self.book_for(&patient, &request.doc_id, &request.slot_date, &request.slot_time, None)
            .await
    }

    /// Reserve the slot on the doctor's calendar, then record the appointment.
    ///
    /// `amount` defaults to the doctor's fees. If the appointment cannot be
    /// stored the slot is handed back before the error is returned.
    pub async fn book_for(
        &self,
        patient: &Patient,
        doc_id: &str,
        slot_date: &str,
        slot_time: &str,
        amount: Option<f64>,
    ) -> Result<Appointment, AppointmentError> {
        let key = slots::validate_slot(slots::clinic_now(&self.config), slot_date, slot_time)
            .map_err(doctor_cell::models::DoctorError::from)?;
        debug!("Booking {} {} with doctor {} for patient {}", key.date, key.time, doc_id, patient.id);

        let doctor = self.doctors.reserve_slot(doc_id, &key).await?;

        let appointment_data = json!({
            "user_id": patient.id,
            "doc_id": doctor.id,
            "slot_date": key.date,
            "slot_time": key.time,
            "user_data": patient.snapshot(),
            "doc_data": doctor.snapshot(),
            "amount": amount.unwrap_or(doctor.fees),
            "created_at": Utc::now().to_rfc3339(),
            "cancelled": false,
            "payment": false,
            "is_completed": false
        });

        match self.insert_appointment(appointment_data).await {
            Ok(appointment) => {
                info!(
                    "Appointment {} booked: doctor {} on {} at {}",
                    appointment.id, appointment.doc_id, appointment.slot_date, appointment.slot_time
                );
                Ok(appointment)
            }
            Err(e) => {
                warn!("Appointment insert failed, releasing {} {} for doctor {}", key.date, key.time, doc_id);
                self.compensate(doc_id, &key).await;
                Err(e)
            }
        }
    }

    pub async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", urlencoding::encode(appointment_id));
        let result: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;

        result.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.list(&format!("user_id=eq.{}&", urlencoding::encode(user_id))).await
    }

    pub async fn list_for_doctor(&self, doc_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.list(&format!("doc_id=eq.{}&", urlencoding::encode(doc_id))).await
    }

    pub async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.list("").await
    }

    pub async fn cancel_by_user(&self, user_id: &str, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;
        if appointment.user_id != user_id {
            warn!("User {} tried to cancel appointment {} they do not own", user_id, appointment_id);
            return Err(AppointmentError::Unauthorized);
        }
        self.cancel(appointment).await
    }

    pub async fn cancel_by_doctor(&self, doc_id: &str, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;
        if appointment.doc_id != doc_id {
            warn!("Doctor {} tried to cancel appointment {} of another doctor", doc_id, appointment_id);
            return Err(AppointmentError::Unauthorized);
        }
        self.cancel(appointment).await
    }

    pub async fn cancel_by_admin(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;
        self.cancel(appointment).await
    }

    pub async fn complete(&self, doc_id: &str, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;
        if appointment.doc_id != doc_id {
            return Err(AppointmentError::Unauthorized);
        }
        if appointment.cancelled {
            return Err(AppointmentError::CompletingCancelled);
        }
        if appointment.is_completed {
            return Err(AppointmentError::AlreadyCompleted);
        }

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&cancelled=eq.false",
            urlencoding::encode(appointment_id)
        );
        let result: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "is_completed": true })),
                Some(return_representation()),
            )
            .await?;

        let completed = result.into_iter().next().ok_or(AppointmentError::CompletingCancelled)?;
        info!("Appointment {} completed by doctor {}", appointment_id, doc_id);
        Ok(completed)
    }

    /// Flag the appointment cancelled and free its slot.
    async fn cancel(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        if appointment.cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }
        if appointment.is_completed {
            return Err(AppointmentError::AlreadyCompleted);
        }

        // Only the request that flips the flag goes on to release the slot.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&cancelled=eq.false&is_completed=eq.false",
            urlencoding::encode(&appointment.id)
        );
        let result: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "cancelled": true })),
                Some(return_representation()),
            )
            .await?;
        let cancelled = result.into_iter().next().ok_or(AppointmentError::AlreadyCancelled)?;

        // The cancellation is already committed; a failed release is only logged.
        if let Err(e) = self
            .doctors
            .release_slot(&cancelled.doc_id, &cancelled.slot_date, &cancelled.slot_time)
            .await
        {
            error!(
                "Appointment {} cancelled but slot {} {} for doctor {} was not released: {}",
                cancelled.id, cancelled.slot_date, cancelled.slot_time, cancelled.doc_id, e
            );
        }

        info!("Appointment {} cancelled", cancelled.id);
        Ok(cancelled)
    }

    async fn compensate(&self, doc_id: &str, key: &SlotKey) {
        if let Err(e) = self.doctors.release_slot(doc_id, &key.date, &key.time).await {
            error!("Failed to release {} {} for doctor {} after a failed booking: {}", key.date, key.time, doc_id, e);
        }
    }

    async fn insert_appointment(&self, appointment_data: serde_json::Value) -> Result<Appointment, AppointmentError> {
        let result: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(appointment_data),
                Some(return_representation()),
            )
            .await?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database(anyhow::anyhow!("Failed to create appointment")))
    }

    async fn list(&self, filter: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?{}order=created_at.desc", filter);
        let appointments: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(appointments)
    }
}
