use std::collections::HashSet;

use futures::TryFutureExt;
use tracing::debug;

use doctor_cell::services::DoctorService;
use patient_cell::services::PatientService;
use shared_config::AppConfig;

use crate::models::{AdminDashboard, Appointment, AppointmentError, DoctorDashboard, LATEST_APPOINTMENTS};
use crate::services::booking::BookingService;

/// Most recent appointments first, capped at [`LATEST_APPOINTMENTS`].
pub fn latest_appointments(appointments: &[Appointment]) -> Vec<Appointment> {
    let mut latest = appointments.to_vec();
    latest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    latest.truncate(LATEST_APPOINTMENTS);
    latest
}

pub fn summarize_doctor(appointments: &[Appointment]) -> DoctorDashboard {
    let earnings = appointments
        .iter()
        .filter(|appointment| appointment.is_settled())
        .map(|appointment| appointment.amount)
        .sum();

    let patients: HashSet<&str> = appointments
        .iter()
        .map(|appointment| appointment.user_id.as_str())
        .collect();

    DoctorDashboard {
        earnings,
        appointments: appointments.len(),
        patients: patients.len(),
        latest_appointments: latest_appointments(appointments),
    }
}

pub struct DashboardService {
    bookings: BookingService,
    doctors: DoctorService,
    patients: PatientService,
}

impl DashboardService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            bookings: BookingService::new(config),
            doctors: DoctorService::new(config),
            patients: PatientService::new(config),
        }
    }

    pub async fn doctor_dashboard(&self, doc_id: &str) -> Result<DoctorDashboard, AppointmentError> {
        let appointments = self.bookings.list_for_doctor(doc_id).await?;
        debug!("Building dashboard for doctor {} over {} appointments", doc_id, appointments.len());
        Ok(summarize_doctor(&appointments))
    }

    pub async fn admin_dashboard(&self) -> Result<AdminDashboard, AppointmentError> {
        let (doctors, appointments, patients) = futures::try_join!(
            self.doctors.list_doctors().map_err(AppointmentError::from),
            self.bookings.list_all(),
            self.patients.list_patients().map_err(AppointmentError::from),
        )?;

        Ok(AdminDashboard {
            doctors: doctors.len(),
            appointments: appointments.len(),
            patients: patients.len(),
            latest_appointments: latest_appointments(&appointments),
        })
    }
}
