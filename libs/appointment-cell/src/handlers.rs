use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use patient_cell::forms::patient_intake_from_form;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::form::MultipartForm;

use crate::models::{AppointmentActionRequest, BookAppointmentRequest};
use crate::services::{BookingService, DashboardService, IntakeService};

// ==============================================================================
// PATIENT PORTAL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = BookingService::new(&config).book(&user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn user_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = BookingService::new(&config).list_for_user(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn user_cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<AppointmentActionRequest>,
) -> Result<Json<Value>, AppError> {
    BookingService::new(&config)
        .cancel_by_user(&user.id, &request.appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully"
    })))
}

// ==============================================================================
// DOCTOR PANEL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = BookingService::new(&config).list_for_doctor(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<AppointmentActionRequest>,
) -> Result<Json<Value>, AppError> {
    BookingService::new(&config)
        .complete(&user.id, &request.appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Completed"
    })))
}

#[axum::debug_handler]
pub async fn doctor_cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<AppointmentActionRequest>,
) -> Result<Json<Value>, AppError> {
    BookingService::new(&config)
        .cancel_by_doctor(&user.id, &request.appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Cancelled"
    })))
}

#[axum::debug_handler]
pub async fn doctor_dashboard(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let dash_data = DashboardService::new(&config).doctor_dashboard(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "dash_data": dash_data
    })))
}

// ==============================================================================
// ADMIN PANEL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn all_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = BookingService::new(&config).list_all().await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn admin_cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<AppointmentActionRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Admin {:?} cancelling appointment {}", user.email, request.appointment_id);
    BookingService::new(&config)
        .cancel_by_admin(&request.appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Cancelled"
    })))
}

#[axum::debug_handler]
pub async fn admin_dashboard(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let dash_data = DashboardService::new(&config).admin_dashboard().await?;

    Ok(Json(json!({
        "success": true,
        "dash_data": dash_data
    })))
}

#[axum::debug_handler]
pub async fn add_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut form = MultipartForm::from_multipart(multipart).await?;
    let intake = patient_intake_from_form(&form)?;

    let outcome = IntakeService::new(&config)
        .add_patient(intake, form.take_image())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient added successfully",
        "patient_id": outcome.patient.id,
        "default_password": outcome.default_password,
        "appointment": outcome.appointment,
        "appointment_error": outcome.appointment_error
    })))
}
