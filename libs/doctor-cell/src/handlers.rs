use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::form::MultipartForm;

use crate::models::{
    Address, ChangeAvailabilityRequest, DoctorError, NewDoctor, PublicDoctor, SlotQuery,
    UpdateDoctorProfileRequest,
};
use crate::services::doctor::DoctorService;
use crate::services::slots::{self, SlotError};

const DOCTOR_FORM_FIELDS: [&str; 9] = [
    "name",
    "email",
    "password",
    "speciality",
    "degree",
    "experience",
    "about",
    "fees",
    "address",
];

pub(crate) fn new_doctor_from_form(form: &MultipartForm) -> Result<NewDoctor, AppError> {
    let missing = form.missing(&DOCTOR_FORM_FIELDS);
    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!("Missing Details: {}", missing.join(", "))));
    }

    let address: Address = form.json("address")?.unwrap_or_default();

    Ok(NewDoctor {
        name: form.text_owned("name").unwrap_or_default(),
        email: form.text_owned("email").unwrap_or_default(),
        password: form.text_owned("password").unwrap_or_default(),
        speciality: form.text_owned("speciality").unwrap_or_default(),
        degree: form.text_owned("degree").unwrap_or_default(),
        experience: form.text_owned("experience").unwrap_or_default(),
        about: form.text_owned("about").unwrap_or_default(),
        fees: form.amount("fees")?.unwrap_or_default(),
        address,
    })
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors: Vec<PublicDoctor> = doctor_service
        .list_doctors()
        .await?
        .iter()
        .map(|doctor| doctor.public_view())
        .collect();

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}

/// Seven-day slot grid for a doctor, or a single day when `?date=` is given.
#[axum::debug_handler]
pub async fn get_doctor_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doc_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.get_doctor(&doc_id).await?;

    let week = slots::generate_week(slots::clinic_now(&state), &doctor.slots_booked);

    let Some(raw_date) = query.date else {
        return Ok(Json(json!({
            "success": true,
            "doctor_id": doctor.id,
            "available": doctor.available,
            "days": week
        })));
    };

    let date = slots::format_date(slots::parse_slot_date(&raw_date).map_err(DoctorError::from)?);
    let day = week
        .iter()
        .find(|day| day.date == date)
        .ok_or(DoctorError::Slot(SlotError::OutsideWindow))?;

    debug!("Doctor {} has {} free slots on {}", doc_id, day.free_times().len(), date);

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor.id,
        "available": doctor.available,
        "date": day.date,
        "slots": day.slots,
        "free_times": day.free_times()
    })))
}

// ==============================================================================
// DOCTOR PANEL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).get_doctor(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "profile_data": doctor
    })))
}

#[axum::debug_handler]
pub async fn update_doctor_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).update_profile(&user.id, request).await?;
    info!("Doctor {} updated their profile", user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Profile Updated",
        "profile_data": doctor
    })))
}

#[axum::debug_handler]
pub async fn doctor_change_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).toggle_availability(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability Changed",
        "available": doctor.available
    })))
}

// ==============================================================================
// ADMIN PANEL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn add_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut form = MultipartForm::from_multipart(multipart).await?;
    let new_doctor = new_doctor_from_form(&form)?;
    let image = form
        .take_image()
        .ok_or_else(|| AppError::ValidationError("Image file is required".to_string()))?;

    debug!("Admin {:?} adding doctor {}", user.email, new_doctor.email);
    let doctor = DoctorService::new(&state).create_doctor(new_doctor, image).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor Added",
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn all_doctors(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state).list_doctors().await?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn admin_change_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Json(request): Json<ChangeAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).toggle_availability(&request.doc_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability Changed",
        "available": doctor.available
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn complete_form() -> MultipartForm {
        MultipartForm::from_fields([
            ("name", "Dr. Emily Larson"),
            ("email", "emily@happyodent.com"),
            ("password", "larson1"),
            ("speciality", "Orthodontist"),
            ("degree", "BDS, MDS"),
            ("experience", "3 Years"),
            ("about", "Braces and aligners."),
            ("fees", "600"),
            ("address", r#"{"line1":"27th Cross","line2":"Richmond"}"#),
        ])
    }

    #[test]
    fn test_new_doctor_from_form() {
        let doctor = new_doctor_from_form(&complete_form()).unwrap();
        assert_eq!(doctor.fees, 600.0);
        assert_eq!(doctor.address.line1, "27th Cross");
    }

    #[test]
    fn test_new_doctor_from_form_reports_missing() {
        let form = MultipartForm::from_fields([("name", "Dr. Nobody")]);
        assert_matches!(
            new_doctor_from_form(&form),
            Err(AppError::ValidationError(msg)) if msg.starts_with("Missing Details") && msg.contains("email")
        );
    }
}
