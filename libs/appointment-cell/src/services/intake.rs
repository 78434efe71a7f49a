use tracing::{info, warn};

use patient_cell::models::PatientIntake;
use patient_cell::services::PatientService;
use shared_config::AppConfig;
use shared_utils::form::UploadedImage;

use crate::models::{AppointmentError, IntakeOutcome};
use crate::services::booking::BookingService;

/// Front-desk registration, optionally booking the patient straight in.
pub struct IntakeService {
    patients: PatientService,
    bookings: BookingService,
}

impl IntakeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            patients: PatientService::new(config),
            bookings: BookingService::new(config),
        }
    }

    /// The patient record is kept even when the requested booking fails;
    /// the failure is reported on the outcome instead.
    pub async fn add_patient(
        &self,
        intake: PatientIntake,
        image: Option<UploadedImage>,
    ) -> Result<IntakeOutcome, AppointmentError> {
        let booking = match (&intake.assigned_doctor, &intake.appointment_date, &intake.appointment_time) {
            (Some(doc_id), Some(date), Some(time)) => Some((doc_id.clone(), date.clone(), time.clone())),
            _ => None,
        };
        let fees = intake.billing.fees;

        let (patient, default_password) = self.patients.create_patient(intake, image).await?;

        let mut outcome = IntakeOutcome {
            patient,
            default_password,
            appointment: None,
            appointment_error: None,
        };

        if let Some((doc_id, date, time)) = booking {
            let amount = (fees > 0.0).then_some(fees);
            match self.bookings.book_for(&outcome.patient, &doc_id, &date, &time, amount).await {
                Ok(appointment) => {
                    info!("Booked intake appointment {} for patient {}", appointment.id, outcome.patient.id);
                    outcome.appointment = Some(appointment);
                }
                Err(e) => {
                    warn!("Patient {} created but appointment booking failed: {}", outcome.patient.id, e);
                    outcome.appointment_error = Some(e.to_string());
                }
            }
        }

        Ok(outcome)
    }
}
